//! Sentry context helpers.
//!
//! Errors themselves are typed per module ([`crate::api::ApiError`],
//! [`crate::session::SessionError`], ...) and turned into view state where
//! they happen. These helpers attach the signed-in user and a trail of
//! actions to whatever Sentry ends up capturing. Without a configured client
//! they are no-ops.

use eshop_core::UserProfile;

/// Associate subsequent Sentry events with `profile`.
pub fn set_sentry_user(profile: &UserProfile) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(profile.id.to_string()),
            email: Some(profile.email.clone()),
            ..Default::default()
        }));
    });
}

/// Stop associating events with the logged-out user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a user action in the breadcrumb trail.
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Entered SelectAddress", &[("product_id", "p1")]);
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
