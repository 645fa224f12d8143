//! Sign-in, registration and sign-out.

use marketstall_core::{Email, RegisterRequest};
use marketstall_storefront::{SessionState, Storefront, StorefrontError};
use secrecy::ExposeSecret;

use super::{line, print_profile, read_password, restore_session};

/// Profile fields collected by `ms-cli register`.
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// Sign in and store the credentials.
pub async fn login(
    storefront: &Storefront,
    email: Email,
    password: Option<String>,
) -> Result<(), StorefrontError> {
    let password = read_password(password)?;
    let profile = storefront.session().login(email, password).await?;
    line(&format!("Signed in as {}.", profile.display_name()));
    Ok(())
}

/// Create an account, then sign in with it.
pub async fn register(
    storefront: &Storefront,
    details: Registration,
    password: Option<String>,
) -> Result<(), StorefrontError> {
    let password = read_password(password)?;
    let request = RegisterRequest {
        first_name: details.first_name,
        last_name: details.last_name,
        email: details.email,
        password: password.expose_secret().to_owned(),
        phone: details.phone,
        country: details.country,
        city: details.city,
    };

    let profile = storefront.session().register(request).await?;
    line(&format!("Welcome, {}! Your account is ready.", profile.display_name()));
    Ok(())
}

/// Forget the stored credentials.
pub fn logout(storefront: &Storefront) {
    storefront.session().logout();
    line("Signed out.");
}

/// Show the signed-in user.
pub async fn whoami(storefront: &Storefront) -> Result<(), StorefrontError> {
    match restore_session(storefront).await? {
        SessionState::Authenticated(profile) => print_profile(&profile),
        _ => line("Not signed in."),
    }
    Ok(())
}
