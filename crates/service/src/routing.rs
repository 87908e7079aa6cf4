//! Checks on user-supplied target and filter parameters.

use models::InstanceKind;
use thiserror::Error;

use crate::directory::EntityDirectory;
use crate::errors::ServiceError;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Invalid/missing URL query parameter: {0}")]
    InvalidParam(&'static str),
    /// The id is well-formed but its entity does not exist.
    #[error("Invalid {0}.")]
    InvalidInstance(&'static str),
    #[error(transparent)]
    Lookup(#[from] ServiceError),
}

fn id_label(kind: InstanceKind) -> &'static str {
    match kind {
        InstanceKind::Category => "Category ID",
        InstanceKind::Course => "Course ID",
        InstanceKind::Module => "Activity module ID",
        InstanceKind::Dashboard => "Dashboard ID",
    }
}

/// Resolve and check an `(instance, contextinstanceid)` pair from a request.
pub async fn check_target(
    directory: &dyn EntityDirectory,
    instance: &str,
    context_instance_id: i64,
) -> Result<InstanceKind, RoutingError> {
    let kind: InstanceKind = instance.parse().map_err(|_| RoutingError::InvalidParam("instance"))?;
    kind.validate_context_instance_id(context_instance_id)
        .map_err(|_| RoutingError::InvalidParam("contextinstanceid"))?;
    if context_instance_id > 0 && !directory.exists(kind, context_instance_id).await? {
        return Err(RoutingError::InvalidInstance(id_label(kind)));
    }
    Ok(kind)
}

/// Instance kinds with a management listing: everything but the dashboard.
pub fn check_listing_kind(instance: &str) -> Result<InstanceKind, RoutingError> {
    match instance.parse::<InstanceKind>() {
        Ok(kind) if kind != InstanceKind::Dashboard => Ok(kind),
        _ => Err(RoutingError::InvalidParam("instance")),
    }
}

/// Check the optional category and course filters of a listing.
pub async fn check_filters(
    directory: &dyn EntityDirectory,
    catid: Option<i64>,
    cid: Option<i64>,
) -> Result<(), RoutingError> {
    if let Some(id) = catid {
        if id <= 0 {
            return Err(RoutingError::InvalidParam("catid"));
        }
        if !directory.exists(InstanceKind::Category, id).await? {
            return Err(RoutingError::InvalidInstance("Category"));
        }
    }
    if let Some(id) = cid {
        if id <= 0 {
            return Err(RoutingError::InvalidParam("cid"));
        }
        if !directory.exists(InstanceKind::Course, id).await? {
            return Err(RoutingError::InvalidInstance("Course"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::mock::MockEntityDirectory;

    fn dir() -> MockEntityDirectory {
        let d = MockEntityDirectory::default();
        d.add_category(1, "Science").add_course(5, 1, "Physics").add_module(9, 5, "page", "Intro");
        d
    }

    #[tokio::test]
    async fn accepts_live_and_unset_targets() {
        let d = dir();
        assert_eq!(check_target(&d, "course", 5).await.unwrap(), InstanceKind::Course);
        assert_eq!(check_target(&d, "category", -1).await.unwrap(), InstanceKind::Category);
        assert_eq!(check_target(&d, "dashboard", -1).await.unwrap(), InstanceKind::Dashboard);
        assert_eq!(check_target(&d, "module", 9).await.unwrap(), InstanceKind::Module);
    }

    #[tokio::test]
    async fn rejects_bad_params() {
        let d = dir();
        let err = check_target(&d, "blog", 1).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid/missing URL query parameter: instance");
        for (inst, id) in [("course", 0), ("module", -1), ("dashboard", 3), ("category", -7)] {
            let err = check_target(&d, inst, id).await.unwrap_err();
            assert!(matches!(err, RoutingError::InvalidParam("contextinstanceid")), "{inst} {id}");
        }
    }

    #[tokio::test]
    async fn missing_entity_is_invalid_instance() {
        let d = dir();
        let err = check_target(&d, "course", 6).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid Course ID.");
        let err = check_target(&d, "module", 10).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid Activity module ID.");
    }

    #[tokio::test]
    async fn filters() {
        let d = dir();
        assert!(check_filters(&d, None, None).await.is_ok());
        assert!(check_filters(&d, Some(1), Some(5)).await.is_ok());
        assert!(matches!(check_filters(&d, Some(2), None).await, Err(RoutingError::InvalidInstance("Category"))));
        assert!(matches!(check_filters(&d, None, Some(6)).await, Err(RoutingError::InvalidInstance("Course"))));
        assert!(matches!(check_filters(&d, Some(0), None).await, Err(RoutingError::InvalidParam("catid"))));
    }

    #[test]
    fn listing_kinds() {
        assert_eq!(check_listing_kind("module").unwrap(), InstanceKind::Module);
        assert!(check_listing_kind("dashboard").is_err());
        assert!(check_listing_kind("").is_err());
    }
}
