use crate::{AuthUser, AuthzError};

/// A record with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> i32;
}

/// Refuse unless `user` owns `record`.
pub fn ensure_owner<T: Owned + ?Sized>(user: &AuthUser, record: &T) -> Result<(), AuthzError> {
    if record.owner_id() == user.user_id {
        Ok(())
    } else {
        tracing::warn!(
            user_id = user.user_id,
            owner_id = record.owner_id(),
            "ownership check failed"
        );
        Err(AuthzError::NotOwner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        user_id: i32,
    }

    impl Owned for Note {
        fn owner_id(&self) -> i32 {
            self.user_id
        }
    }

    fn user(id: i32) -> AuthUser {
        AuthUser {
            user_id: id,
            username: format!("user{id}"),
        }
    }

    #[test]
    fn owner_passes() {
        assert!(ensure_owner(&user(3), &Note { user_id: 3 }).is_ok());
    }

    #[test]
    fn stranger_is_refused() {
        let err = ensure_owner(&user(4), &Note { user_id: 3 }).unwrap_err();
        assert!(matches!(err, AuthzError::NotOwner));
    }
}
