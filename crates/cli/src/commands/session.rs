//! Session commands: `login`, `logout`, `status` and `route`.

use secrecy::SecretString;
use ventas_client::Credentials;

use super::{App, CommandError};

/// Log in and save the token to the session file.
///
/// Arguments take precedence over `VENTAS_USERNAME` / `VENTAS_PASSWORD`.
pub async fn login(
    app: &App,
    username: Option<String>,
    password: Option<SecretString>,
) -> Result<(), CommandError> {
    let username = username
        .or_else(|| app.config.username.clone())
        .ok_or(CommandError::MissingCredential("username", "VENTAS_USERNAME"))?;
    let password = password
        .or_else(|| app.config.password.clone())
        .ok_or(CommandError::MissingCredential("password", "VENTAS_PASSWORD"))?;

    let session = app
        .gateway
        .authenticate(&Credentials::new(username, password))
        .await?;
    println!("Logged in; session valid until {}", session.expires_at());

    // Same as landing on the login page with a fresh session.
    app.guard
        .navigate(app.config.client.routes.login_path())
        .await;
    Ok(())
}

/// Forget the saved session.
pub async fn logout(app: &App) {
    if app.gateway.logout().await {
        println!("Logged out");
    } else {
        println!("No active session");
    }
}

/// Show whether a live session is saved.
pub async fn status(app: &App) {
    match app.gateway.session().current().await {
        Some(session) => println!(
            "Logged in since {} (expires {})",
            session.issued_at(),
            session.expires_at()
        ),
        None => println!("Not logged in"),
    }
}

/// Show what the route guard decides for `path` with the saved session.
pub async fn route(app: &App, path: &str) {
    let decision = app.guard.navigate(path).await;
    match decision.redirect_to {
        Some(target) => println!("{path} -> redirect to {target}"),
        None => println!("{path} -> allow"),
    }
}
