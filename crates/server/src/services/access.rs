use crate::error::{AppError, ForbiddenReason, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Retrieve,
    CreateProject,
    Create,
    Update,
    Delete,
}

/// Decides whether `principal` may perform `action` inside the project the
/// target resolves to. `contributor` is the principal's membership in that
/// project (`None` when there is no project scope, i.e. project creation or
/// an unscoped collection list); `object_author` is the author of the target
/// object when one exists. Membership never implies write access and
/// authorship never implies read access.
pub fn authorize(
    principal: &str,
    action: Action,
    contributor: Option<bool>,
    object_author: Option<&str>,
) -> Result<()> {
    match action {
        // Anyone authenticated can start a project; there is no parent
        // project to be a member of.
        Action::CreateProject => Ok(()),
        // Unscoped collection listings are filtered down to the principal's
        // projects by the queries themselves; a listing scoped to one
        // project is a safe read of that project.
        Action::List => match contributor {
            None | Some(true) => Ok(()),
            Some(false) => Err(AppError::Forbidden(ForbiddenReason::NotAContributor)),
        },
        Action::Retrieve | Action::Create => {
            if contributor == Some(true) {
                Ok(())
            } else {
                Err(AppError::Forbidden(ForbiddenReason::NotAContributor))
            }
        }
        Action::Update | Action::Delete => match object_author {
            Some(author) if author == principal => Ok(()),
            _ => Err(AppError::Forbidden(ForbiddenReason::NotAnAuthor)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: Result<()>) -> ForbiddenReason {
        match result {
            Err(AppError::Forbidden(reason)) => reason,
            other => panic!("expected a forbidden error, got {other:?}"),
        }
    }

    #[test]
    fn project_creation_is_open_to_any_principal() {
        assert!(authorize("alice", Action::CreateProject, None, None).is_ok());
    }

    #[test]
    fn unscoped_list_is_allowed() {
        assert!(authorize("alice", Action::List, None, None).is_ok());
    }

    #[test]
    fn scoped_list_requires_membership() {
        assert!(authorize("alice", Action::List, Some(true), None).is_ok());
        assert_eq!(
            reason(authorize("alice", Action::List, Some(false), None)),
            ForbiddenReason::NotAContributor
        );
    }

    #[test]
    fn retrieve_requires_membership() {
        assert!(authorize("alice", Action::Retrieve, Some(true), Some("bob")).is_ok());
        assert_eq!(
            reason(authorize("alice", Action::Retrieve, Some(false), Some("bob"))),
            ForbiddenReason::NotAContributor
        );
    }

    #[test]
    fn authorship_does_not_grant_read_access() {
        // An author who is no longer a contributor cannot read the object.
        assert_eq!(
            reason(authorize("alice", Action::Retrieve, Some(false), Some("alice"))),
            ForbiddenReason::NotAContributor
        );
    }

    #[test]
    fn create_requires_membership_in_the_parent_project() {
        assert!(authorize("alice", Action::Create, Some(true), None).is_ok());
        assert_eq!(
            reason(authorize("alice", Action::Create, Some(false), None)),
            ForbiddenReason::NotAContributor
        );
        // No resolved parent scope means no grounds to allow.
        assert_eq!(
            reason(authorize("alice", Action::Create, None, None)),
            ForbiddenReason::NotAContributor
        );
    }

    #[test]
    fn updates_require_authorship() {
        assert!(authorize("alice", Action::Update, Some(true), Some("alice")).is_ok());
        assert_eq!(
            reason(authorize("alice", Action::Update, Some(true), Some("bob"))),
            ForbiddenReason::NotAnAuthor
        );
    }

    #[test]
    fn deletes_require_authorship() {
        assert!(authorize("alice", Action::Delete, Some(true), Some("alice")).is_ok());
        assert_eq!(
            reason(authorize("alice", Action::Delete, Some(true), Some("bob"))),
            ForbiddenReason::NotAnAuthor
        );
    }

    #[test]
    fn membership_does_not_grant_write_access() {
        assert_eq!(
            reason(authorize("alice", Action::Delete, Some(true), Some("bob"))),
            ForbiddenReason::NotAnAuthor
        );
    }

    #[test]
    fn authorship_grants_write_access_without_membership() {
        // The stricter read rule does not extend to writes: the author keeps
        // modify rights on their own object.
        assert!(authorize("alice", Action::Update, Some(false), Some("alice")).is_ok());
    }

    #[test]
    fn writes_without_a_target_are_denied() {
        assert_eq!(
            reason(authorize("alice", Action::Update, Some(true), None)),
            ForbiddenReason::NotAnAuthor
        );
    }
}
