//! Session command handlers.

use std::path::PathBuf;

use anyhow::{Result, anyhow, bail};
use taskdeck_core::config::Config;
use taskdeck_core::guard::{Access, Route};
use taskdeck_core::models::{ProfileImage, Registration, User};
use taskdeck_core::validation;

use super::{Client, NOT_LOGGED_IN, password_or_stdin};

pub struct RegisterForm {
    pub names: String,
    pub lastnames: String,
    pub age: u32,
    pub email: String,
    pub password: Option<String>,
    pub profile_image: Option<PathBuf>,
}

/// Public pages bounce signed-in users; mirror that before prompting.
async fn already_signed_in(client: &Client) -> Option<User> {
    let ctx = client.ctx();
    ctx.session().verify().await;
    match ctx.guard(Route::Login).await {
        Access::Redirect(_) => ctx.session().user().await,
        Access::Allow | Access::Pending => None,
    }
}

async fn session_error(client: &Client) -> anyhow::Error {
    let session = client.ctx().session().snapshot().await;
    anyhow!(session.error.unwrap_or_else(|| "Request failed".to_string()))
}

pub async fn login(client: &Client, email: &str, password: Option<String>) -> Result<()> {
    if let Some(user) = already_signed_in(client).await {
        println!("Already logged in as {}.", user.display_name());
        return Ok(());
    }

    let password = password_or_stdin(password)?;
    validation::validate_login(email, &password)?;

    if client.ctx().login(email.trim(), &password).await.is_none() {
        return Err(session_error(client).await);
    }
    let name = client
        .ctx()
        .session()
        .user()
        .await
        .map(|user| user.display_name())
        .unwrap_or_default();
    println!("Logged in as {name}.");
    Ok(())
}

pub async fn register(client: &Client, form: RegisterForm) -> Result<()> {
    if let Some(user) = already_signed_in(client).await {
        println!("Already logged in as {}.", user.display_name());
        return Ok(());
    }

    let profile_image = form
        .profile_image
        .as_deref()
        .map(ProfileImage::from_path)
        .transpose()?;
    let data = Registration {
        names: form.names.trim().to_string(),
        lastnames: form.lastnames.trim().to_string(),
        age: form.age,
        email: form.email.trim().to_string(),
        password: password_or_stdin(form.password)?,
        profile_image,
    };
    validation::validate_registration(&data)?;

    if client.ctx().register(&data).await.is_none() {
        return Err(session_error(client).await);
    }
    println!("Welcome, {}!", data.names);
    Ok(())
}

pub async fn logout(client: &Client) -> Result<()> {
    client.ctx().logout().await;
    client.forget_session();
    println!("Logged out.");
    Ok(())
}

pub async fn whoami(client: &Client, config: &Config) -> Result<()> {
    client.ctx().session().verify().await;
    let Some(user) = client.ctx().session().user().await else {
        bail!(NOT_LOGGED_IN);
    };

    println!("{} <{}>", user.display_name(), user.email);
    if let Some(url) = user
        .profile_image
        .as_deref()
        .and_then(|image| config.profile_image_url(image))
    {
        println!("Profile image: {url}");
    }
    Ok(())
}
