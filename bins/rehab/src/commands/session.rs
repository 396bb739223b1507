//! Login, logout and profile commands

use super::Context;
use crate::output::{cache_marker, emit, Status};
use anyhow::Result;
use rehab_api_client::prelude::Credentials;
use serde_json::json;

/// Sign in and persist the token
pub async fn login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let session = ctx
        .client
        .auth()
        .login(&Credentials::new(email, password))
        .await?;

    // The token stays in the session file; only the user is printed
    emit(ctx.format, &session.user, |_| {
        Status::success(&format!("Signed in as {email}"));
    })
}

/// Sign out; succeeds even when the backend is unreachable
pub async fn logout(ctx: &Context) -> Result<()> {
    // An unreadable session file counts as signed out; logout resets it
    let was_signed_in = ctx.client.auth().is_authenticated().await.unwrap_or(false);
    ctx.client.auth().logout().await?;

    emit(ctx.format, &json!({ "signed_out": was_signed_in }), |_| {
        if was_signed_in {
            Status::success("Signed out");
        } else {
            Status::info("No active session");
        }
    })
}

/// Show the signed-in user
pub async fn profile(ctx: &Context) -> Result<()> {
    let fetched = ctx.client.auth().profile().await?;

    emit(ctx.format, &fetched, |fetched| {
        let user = &fetched.data;
        Status::header(user.name.as_deref().unwrap_or("Profile"));
        println!("id:    {}", user.id);
        if let Some(email) = &user.email {
            println!("email: {email}");
        }
        println!("{}", cache_marker(fetched.from_cache));
    })
}
