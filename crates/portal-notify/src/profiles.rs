//! Profile notices

use crate::mailer::{MailSettings, Mailer};
use crate::render::render_welcome;
use portal_model::UserProfile;

/// Send the welcome email for a newly created profile
///
/// The profile already exists when this runs. Delivery failures are logged
/// and reported as `false`, never as an error.
#[tracing::instrument(skip_all, fields(user = %user.id))]
pub async fn notify_profile_created<M: Mailer + ?Sized>(
    mailer: &M,
    settings: &MailSettings,
    user: &UserProfile,
) -> bool {
    let email = render_welcome(user, settings).into_outgoing(settings, user.email.clone());
    match mailer.send(&email).await {
        Ok(_) => {
            tracing::info!(to = %user.email, "welcome email sent");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, to = %user.email, "welcome email not delivered");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;
    use crate::mailer::{DeliveryReceipt, MockMailer};
    use chrono::Utc;

    #[tokio::test]
    async fn welcome_goes_to_the_new_user() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| email.to == "ana@client.example")
            .times(1)
            .returning(|_| Ok(DeliveryReceipt::default()));
        let user = UserProfile::client("ana@client.example", "Ana", Utc::now());

        assert!(notify_profile_created(&mailer, &MailSettings::default(), &user).await);
    }

    #[tokio::test]
    async fn failure_is_reported_not_raised() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_| Err(MailError::Config("no key".into())));
        let user = UserProfile::client("ana@client.example", "Ana", Utc::now());

        assert!(!notify_profile_created(&mailer, &MailSettings::default(), &user).await);
    }
}
