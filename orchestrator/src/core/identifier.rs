//! Content addressing for tasks
//!
//! The identifier is the SHA-256 of the task's values concatenated in
//! dimension order with no separator. It keys both the storage prefix and
//! the metadata document, so rerunning a task overwrites its earlier output.

use sha2::{Digest, Sha256};

use shared::{ArtifactKind, Task, TaskIdentifier};

/// Top-level folder for every stored advertisement
pub const STORAGE_ROOT: &str = "advertisement";

/// Derive the identifier of a task
pub fn identifier(task: &Task) -> TaskIdentifier {
    identifier_for_values(task.values())
}

/// Derive an identifier from raw attribute values in dimension order
pub fn identifier_for_values<S: AsRef<str>>(values: &[S]) -> TaskIdentifier {
    let mut hasher = Sha256::new();
    for value in values {
        hasher.update(value.as_ref().as_bytes());
    }
    let digest: [u8; 32] = hasher.finalize().into();
    TaskIdentifier::from_digest(&digest)
}

/// Storage prefix shared by all artifacts of a task, e.g. `advertisement/{id}/`
pub fn storage_prefix(identifier: &TaskIdentifier) -> String {
    format!("{STORAGE_ROOT}/{identifier}/")
}

/// Object name of one artifact, e.g. `advertisement/{id}/0.jpg`
pub fn artifact_object_name(identifier: &TaskIdentifier, sequence: u32, kind: ArtifactKind) -> String {
    format!("{}{}.{}", storage_prefix(identifier), sequence, kind.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn task(values: &[&str]) -> Task {
        let names: Arc<[String]> = shared::dimension::ORDER
            .iter()
            .take(values.len())
            .map(|name| name.to_string())
            .collect();
        Task::new(0, names, values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_known_digest() {
        let id = identifier(&task(&["P1", "hot", "north", "male", "adult", "driver"]));
        assert_eq!(
            id.as_str(),
            "723691c2798116873286832978f83172fe4cb3e0bf27334423449edad86241ab"
        );
    }

    #[test]
    fn test_identifier_is_pure() {
        let values = ["P1", "hot", "north", "male", "adult", "driver"];
        assert_eq!(identifier(&task(&values)), identifier(&task(&values)));
    }

    #[test]
    fn test_changing_any_value_changes_identifier() {
        let base = ["P1", "hot", "north", "male", "adult", "driver"];
        let base_id = identifier(&task(&base));

        for index in 0..base.len() {
            let mut changed = base;
            changed[index] = "other";
            assert_ne!(identifier(&task(&changed)), base_id, "position {index}");
        }
    }

    #[test]
    fn test_ordinal_does_not_affect_identifier() {
        let names: Arc<[String]> = vec!["a".to_string()].into();
        let first = Task::new(0, Arc::clone(&names), vec!["x".to_string()]);
        let second = Task::new(7, names, vec!["x".to_string()]);
        assert_eq!(identifier(&first), identifier(&second));
    }

    #[test]
    fn test_identifier_format() {
        let id = identifier_for_values(&["abc"]);
        assert_eq!(id.as_str().len(), TaskIdentifier::HEX_LEN);
        assert_eq!(
            id.as_str(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_storage_layout() {
        let id = identifier_for_values(&["abc"]);
        assert_eq!(storage_prefix(&id), format!("advertisement/{id}/"));
        assert_eq!(
            artifact_object_name(&id, 2, ArtifactKind::Image),
            format!("advertisement/{id}/2.jpg")
        );
        assert_eq!(
            artifact_object_name(&id, 1, ArtifactKind::Narration),
            format!("advertisement/{id}/1.mp3")
        );
    }
}
