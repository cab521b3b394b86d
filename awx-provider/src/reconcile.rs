//! Existence checks run before each mutation
//!
//! AWX enforces nothing about natural keys on its own, so every mutation is
//! preceded by a filtered list call whose result decides whether the
//! mutation may proceed.

use awx_core::provider::{ProviderError, ProviderResult};

use crate::api::Record;

/// Before create: any match on the natural key is a duplicate.
pub fn check_create<R: Record>(kind: &str, matches: &[R]) -> ProviderResult<()> {
    match matches.first() {
        None => Ok(()),
        Some(existing) => Err(ProviderError::duplicate(format!(
            "{} '{}' already exists with id {}",
            kind,
            existing.name(),
            existing.id()
        ))
        .with_identifier(existing.id().to_string())),
    }
}

/// Before update: the record must exist. Extra matches are ignored.
pub fn check_update<R: Record>(kind: &str, identifier: i64, matches: Vec<R>) -> ProviderResult<R> {
    matches.into_iter().next().ok_or_else(|| {
        ProviderError::not_found(format!("{} with id {} doesn't exist", kind, identifier))
    })
}

/// Before delete: `None` means the record is already gone.
pub fn check_delete<R: Record>(matches: Vec<R>) -> Option<R> {
    matches.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Group;
    use awx_core::provider::ErrorKind;

    fn group(id: i64, name: &str) -> Group {
        Group {
            id,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn create_rejects_existing_natural_key() {
        assert!(check_create::<Group>("Inventory group", &[]).is_ok());

        let err = check_create("Inventory group", &[group(10, "webservers")]).unwrap_err();
        assert!(err.is(ErrorKind::Duplicate));
        assert_eq!(err.identifier.as_deref(), Some("10"));
        assert_eq!(
            err.message,
            "Inventory group 'webservers' already exists with id 10"
        );
    }

    #[test]
    fn update_requires_a_match() {
        let err = check_update::<Group>("Inventory group", 10, vec![]).unwrap_err();
        assert!(err.is(ErrorKind::NotFound));

        let found = check_update("Inventory group", 10, vec![group(10, "a"), group(11, "b")]).unwrap();
        assert_eq!(found.id, 10);
    }

    #[test]
    fn delete_of_absent_record_is_not_an_error() {
        assert!(check_delete::<Group>(vec![]).is_none());
        assert_eq!(check_delete(vec![group(10, "a")]).map(|g| g.id), Some(10));
    }
}
