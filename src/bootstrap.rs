//! One-time database setup: schema migrations, the default administrator and
//! the default subscription plans. Every step checks for existing rows first,
//! so running it again leaves the database untouched.

use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, Version};
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use crate::configuration::BootstrapSettings;
use crate::domain::EmailAddress;
use crate::telemetry::spawn_blocking_with_tracing;

pub struct SubscriptionPlan {
    pub name: &'static str,
    pub price: f64,
    pub duration: &'static str,
    pub features: &'static [&'static str],
}

pub const DEFAULT_PLANS: [SubscriptionPlan; 3] = [
    SubscriptionPlan {
        name: "Monthly VIP",
        price: 49.0,
        duration: "1 Month",
        features: &[
            "Real-time XAU/USD signals",
            "Entry & exit points",
            "Risk management guidance",
            "Telegram group access",
            "Basic market analysis",
            "Email support",
        ],
    },
    SubscriptionPlan {
        name: "6-Month VIP",
        price: 249.0,
        duration: "6 Months",
        features: &[
            "All Monthly VIP features",
            "Advanced technical analysis",
            "Weekly market outlook",
            "1-on-1 consultation (monthly)",
            "Custom indicator access",
            "Priority support",
            "Performance tracking",
        ],
    },
    SubscriptionPlan {
        name: "Annual VIP",
        price: 449.0,
        duration: "12 Months",
        features: &[
            "All 6-Month VIP features",
            "Exclusive EA access",
            "Personal trading mentor",
            "Advanced risk calculator",
            "VIP webinar access",
            "Custom strategy development",
            "Lifetime community access",
        ],
    },
];

#[derive(Debug, Default, PartialEq)]
pub struct BootstrapReport {
    pub admin_created: bool,
    pub plans_created: Vec<&'static str>,
}

#[tracing::instrument(name = "Initializing the database", skip_all)]
pub async fn initialize_database(
    pool: &PgPool,
    settings: &BootstrapSettings,
) -> Result<BootstrapReport, anyhow::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("Failed to run database migrations.")?;

    let admin_created = seed_default_admin(pool, settings).await?;

    let mut plans_created = Vec::new();
    for plan in DEFAULT_PLANS.iter() {
        if seed_plan(pool, plan).await? {
            plans_created.push(plan.name);
        }
    }

    Ok(BootstrapReport {
        admin_created,
        plans_created,
    })
}

#[tracing::instrument(
    name = "Seeding the default administrator",
    skip(pool, settings),
    fields(admin_email = %settings.admin_email)
)]
async fn seed_default_admin(
    pool: &PgPool,
    settings: &BootstrapSettings,
) -> Result<bool, anyhow::Error> {
    let email = EmailAddress::parse(settings.admin_email.clone()).map_err(anyhow::Error::msg)?;

    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM admins WHERE email = $1")
        .bind(email.as_ref())
        .fetch_optional(pool)
        .await
        .context("Failed to check for the default administrator.")?;
    if existing.is_some() {
        return Ok(false);
    }

    let password = settings.admin_password.clone();
    let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn the password hashing task.")??;

    sqlx::query("INSERT INTO admins (email, password, name) VALUES ($1, $2, $3)")
        .bind(email.as_ref())
        .bind(password_hash.expose_secret())
        .bind(&settings.admin_name)
        .execute(pool)
        .await
        .context("Failed to create the default administrator.")?;

    tracing::info!("Default admin created successfully");
    Ok(true)
}

#[tracing::instrument(name = "Seeding a subscription plan", skip(pool, plan), fields(plan = plan.name))]
async fn seed_plan(pool: &PgPool, plan: &SubscriptionPlan) -> Result<bool, anyhow::Error> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM subscription_plans WHERE name = $1")
        .bind(plan.name)
        .fetch_optional(pool)
        .await
        .context("Failed to check for an existing subscription plan.")?;
    if existing.is_some() {
        return Ok(false);
    }

    let features =
        serde_json::to_string(plan.features).context("Failed to serialize plan features.")?;
    sqlx::query(
        r#"
        INSERT INTO subscription_plans (name, price, duration, features)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(plan.name)
    .bind(plan.price)
    .bind(plan.duration)
    .bind(features)
    .execute(pool)
    .await
    .context("Failed to insert a subscription plan.")?;

    Ok(true)
}

/// Argon2id PHC string for `password`.
pub fn compute_password_hash(password: SecretString) -> Result<SecretString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::new(
        Algorithm::Argon2id,
        Version::V0x13,
        Params::new(15000, 2, 1, None).map_err(anyhow::Error::msg)?,
    )
    .hash_password(password.expose_secret().as_bytes(), &salt)
    .map_err(anyhow::Error::msg)?
    .to_string();

    Ok(SecretString::from(password_hash))
}
