//! Who may see which listing.

use bizdir_core::UserId;

use crate::{Business, BusinessStatus};

/// The party reading a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(UserId),
    Admin(UserId),
}

impl Business {
    /// Approved listings are public; owners see their own in any status;
    /// admins see everything.
    pub fn is_visible_to(&self, viewer: &Viewer) -> bool {
        match viewer {
            Viewer::Admin(_) => true,
            _ if self.status == BusinessStatus::Approved => true,
            Viewer::User(id) => self.is_owned_by(*id),
            Viewer::Anonymous => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NewBusiness, StatusChange};
    use chrono::Utc;
    use proptest::prelude::*;

    fn business(owner: Option<UserId>, status: BusinessStatus) -> Business {
        let mut b = NewBusiness::new(owner, "Shop", None)
            .unwrap()
            .into_business(Utc::now());
        match status {
            BusinessStatus::Pending => {}
            BusinessStatus::Approved => b.apply(&StatusChange::Approve),
            BusinessStatus::Rejected => b.apply(&StatusChange::reject(Some("no")).unwrap()),
        }
        b
    }

    fn any_status() -> impl Strategy<Value = BusinessStatus> {
        prop_oneof![
            Just(BusinessStatus::Pending),
            Just(BusinessStatus::Approved),
            Just(BusinessStatus::Rejected),
        ]
    }

    #[test]
    fn owner_sees_own_pending_listing() {
        let owner = UserId::new();
        let b = business(Some(owner), BusinessStatus::Pending);
        assert!(b.is_visible_to(&Viewer::User(owner)));
        assert!(!b.is_visible_to(&Viewer::User(UserId::new())));
        assert!(b.is_visible_to(&Viewer::Admin(UserId::new())));
    }

    proptest! {
        #[test]
        fn anonymous_sees_only_approved(status in any_status(), owned in any::<bool>()) {
            let owner = owned.then(UserId::new);
            let b = business(owner, status);
            prop_assert_eq!(
                b.is_visible_to(&Viewer::Anonymous),
                status == BusinessStatus::Approved
            );
        }

        #[test]
        fn admins_see_everything(status in any_status()) {
            let b = business(None, status);
            prop_assert!(b.is_visible_to(&Viewer::Admin(UserId::new())));
        }
    }
}
