//! Session commands: `login`, `logout`, `whoami`, `signup`.

use eshop_storefront::Storefront;
use eshop_storefront::forms::{LoginForm, SignupForm};
use eshop_storefront::services::auth::AuthService;

use super::{CliError, report_navigation};

/// Sign in and persist the session.
#[allow(clippy::print_stdout)]
pub async fn login(
    storefront: &Storefront,
    username: String,
    password: String,
) -> Result<(), CliError> {
    let form = LoginForm { username, password };
    let (snapshot, navigation) = AuthService::new(storefront).sign_in(&form).await?;
    report_navigation(&navigation);

    if let (Some(user), Some(role)) = (&snapshot.user, snapshot.role) {
        println!("Signed in as {} ({role})", user.email);
    }
    Ok(())
}

/// Clear the session.
#[allow(clippy::print_stdout)]
pub fn logout(storefront: &Storefront) -> Result<(), CliError> {
    let navigation = AuthService::new(storefront).logout()?;
    report_navigation(&navigation);
    println!("Signed out");
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn whoami(storefront: &Storefront) {
    let snapshot = storefront.snapshot();
    match (&snapshot.user, snapshot.role) {
        (Some(user), Some(role)) if snapshot.is_logged_in => {
            println!("{} ({role})", user.email);
        }
        _ if snapshot.is_logged_in => println!("Signed in (profile unavailable)"),
        _ => println!("Not signed in"),
    }
}

/// Register a new account.
#[allow(clippy::print_stdout)]
pub async fn signup(storefront: &Storefront, form: SignupForm) -> Result<(), CliError> {
    let (notice, navigation) = AuthService::new(storefront).sign_up(&form).await?;
    report_navigation(&navigation);
    println!("{}", notice.message);
    Ok(())
}
