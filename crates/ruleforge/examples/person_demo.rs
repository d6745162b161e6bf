//! Person Validation Example
//!
//! Declares a person validator with a nested address validator, a strict
//! rule set and an async uniqueness check, then prints the outcomes in
//! English and Turkish.
//!
//! Run with `RUST_LOG=ruleforge=debug` to see evaluation logs.

use std::sync::Arc;
use std::time::Duration;

use ruleforge::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Address {
    street: String,
    city: String,
    country: String,
}

impl Emptiable for Address {}

#[derive(Debug)]
struct Person {
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    tags: Vec<String>,
    address: Address,
}

fn address_validator() -> ValidatorResult<Validator<Address>> {
    Validator::<Address>::builder()
        .rule_for("Street", |a| &a.street, |rule| rule.not_empty().length(5, 100))
        .rule_for("City", |a| &a.city, |rule| rule.not_empty().length(2, 50))
        .rule_for("Country", |a| &a.country, |rule| rule.not_empty().length(2, 50))
        .build()
}

fn person_validator() -> ValidatorResult<Validator<Person>> {
    let address = Arc::new(address_validator()?);

    Validator::<Person>::builder()
        .rule_for("FirstName", |p| &p.first_name, |rule| rule.not_empty().length(2, 50))
        .rule_for("LastName", |p| &p.last_name, |rule| rule.not_empty().length(2, 50))
        .rule_for("Email", |p| &p.email, |rule| {
            rule.not_empty().email().must_async(|email: &String| {
                let email = email.clone();
                async move {
                    // Stand-in for a directory lookup
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    email != "taken@example.com"
                }
            })
            .with_message("{PropertyName} is already registered")
        })
        .rule_for("Tags", |p| &p.tags, |rule| rule.for_each(|tag| tag.not_empty().max_length(16)))
        .rule_for("Address", |p| &p.address, |rule| rule.not_empty().set_validator(address))
        .rule_set("Strict", |set| {
            set.rule_for("Phone", |p| &p.phone, |rule| rule.not_null().matches(r"^\+[0-9]{8,15}$"))
        })
        .build()
}

fn print_outcome(title: &str, outcome: &ValidationOutcome) {
    println!("== {} ==", title);
    println!("{}", outcome);
    println!();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let validator = person_validator()?;

    let person = Person {
        first_name: String::new(),
        last_name: "D".to_string(),
        email: "taken@example.com".to_string(),
        phone: None,
        tags: vec!["rust".to_string(), String::new()],
        address: Address {
            street: String::new(),
            city: "A".to_string(),
            country: String::new(),
        },
    };

    let outcome = validator.validate_async(&person).await?;
    print_outcome("default rules", &outcome);

    let strict = validator
        .validate_with_async(&person, &ValidationOptions::new().rule_set("default,Strict"))
        .await?;
    print_outcome("default + strict", &strict);

    let turkish = ValidationOptions::new().formatter(Arc::new(CatalogFormatter::turkish()));
    let localized = validator.validate_with_async(&person, &turkish).await?;
    print_outcome("tr-TR", &localized);

    println!("{}", serde_json::to_string_pretty(&outcome.to_json())?);

    // Synchronous validation refuses async-only rules
    if let Err(err) = validator.validate(&person) {
        println!("sync validation: {}", err);
    }

    Ok(())
}
