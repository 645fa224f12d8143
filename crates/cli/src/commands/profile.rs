//! Profile management.

use marketstall_storefront::{SessionError, Storefront, StorefrontError};

use super::{line, print_profile, restore_session};

/// Profile fields to change; `None` keeps the current value.
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl ProfileChanges {
    const fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.country.is_none()
            && self.city.is_none()
    }
}

pub async fn update(storefront: &Storefront, changes: ProfileChanges) -> Result<(), StorefrontError> {
    if changes.is_empty() {
        return Err(StorefrontError::InvalidInput(
            "nothing to update; pass at least one field".to_string(),
        ));
    }

    let state = restore_session(storefront).await?;
    let mut profile = state
        .profile()
        .cloned()
        .ok_or(SessionError::NotAuthenticated)?;

    if let Some(first_name) = changes.first_name {
        profile.first_name = first_name;
    }
    if let Some(last_name) = changes.last_name {
        profile.last_name = last_name;
    }
    if changes.phone.is_some() {
        profile.phone = changes.phone;
    }
    if changes.country.is_some() {
        profile.country = changes.country;
    }
    if changes.city.is_some() {
        profile.city = changes.city;
    }

    let updated = storefront.session().update_profile(&profile).await?;
    line("Profile updated.");
    print_profile(&updated);
    Ok(())
}

pub async fn delete(storefront: &Storefront, confirmed: bool) -> Result<(), StorefrontError> {
    if !confirmed {
        return Err(StorefrontError::InvalidInput(
            "account deletion is permanent; re-run with --yes to confirm".to_string(),
        ));
    }

    restore_session(storefront).await?;
    storefront.session().delete_account().await?;
    line("Your account has been deleted.");
    Ok(())
}
