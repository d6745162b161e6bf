//! Behavioural guarantees of rules, chains and validators

use std::io;
use std::sync::Arc;

use ruleforge::prelude::*;
use ruleforge::{BetweenRule, CreditCardRule, EmailRule, LengthRule, RegexRule};

#[derive(Debug, Clone, Default)]
struct Profile {
    name: String,
    nickname: Option<String>,
    email: String,
    tags: Vec<String>,
    age: Option<u32>,
    flag: bool,
}

fn profile() -> Profile {
    Profile {
        name: String::new(),
        nickname: None,
        email: "nobody".to_string(),
        tags: vec![String::new(), "ok".to_string(), String::new()],
        age: Some(15),
        flag: false,
    }
}

fn profile_validator() -> Validator<Profile> {
    Validator::<Profile>::builder()
        .rule_for("Name", |p| &p.name, |rule| rule.not_empty().length(2, 40))
        .rule_for("Email", |p| &p.email, |rule| rule.email())
        .rule_for("Tags", |p| &p.tags, |rule| rule.for_each(|tag| tag.not_empty()))
        .rule_for("Age", |p| &p.age, |rule| rule.between(18, 130))
        .build()
        .unwrap()
}

#[test]
fn test_validation_is_deterministic() {
    let validator = profile_validator();
    let first = validator.validate(&profile()).unwrap();
    let second = validator.validate(&profile()).unwrap();

    assert_eq!(first.failures(), second.failures());
}

#[tokio::test]
async fn test_sync_and_async_agree() {
    let validator = profile_validator();
    let inputs = [
        profile(),
        Profile::default(),
        Profile {
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            tags: vec!["navy".to_string()],
            age: Some(40),
            ..Profile::default()
        },
    ];

    for input in &inputs {
        let sync = validator.validate(input).unwrap();
        let concurrent = validator.validate_async(input).await.unwrap();
        assert_eq!(sync.failures(), concurrent.failures());
    }
}

#[test]
fn test_shape_rules_accept_null() {
    let missing: Option<String> = None;

    assert!(LengthRule::between(2, 5).check(&missing).unwrap().is_valid());
    assert!(RegexRule::new("^[0-9]+$").unwrap().check(&missing).unwrap().is_valid());
    assert!(EmailRule::new().check(&missing).unwrap().is_valid());
    assert!(CreditCardRule::new().check(&missing).unwrap().is_valid());
    assert!(BetweenRule::inclusive(1, 10).check(&None::<i32>).unwrap().is_valid());
}

#[test]
fn test_chain_cascade() {
    let build = |cascade: CascadeMode| {
        Validator::<Profile>::builder()
            .rule_for("Name", |p| &p.name, |rule| {
                rule.cascade(cascade)
                    .not_empty()
                    .min_length(0)
                    .must(|name| name.contains('@'))
                    .must(|name| name.len() > 10)
            })
            .build()
            .unwrap()
    };
    let input = Profile {
        name: String::new(),
        ..profile()
    };

    let stopping = build(CascadeMode::StopOnFirstFailure).validate(&input).unwrap();
    assert_eq!(stopping.len(), 1);
    assert_eq!(stopping.failures()[0].error_code.as_deref(), Some("NotEmpty"));

    let continuing = build(CascadeMode::Continue).validate(&input).unwrap();
    assert_eq!(continuing.len(), 3);
}

#[tokio::test]
async fn test_collection_indexing() {
    let validator = Validator::<Profile>::builder()
        .rule_for("Tags", |p| &p.tags, |rule| rule.for_each(|tag| tag.not_empty()))
        .build()
        .unwrap();

    let outcome = validator.validate(&profile()).unwrap();
    assert_eq!(outcome.property_paths(), vec!["Tags[0]", "Tags[2]"]);
    assert_eq!(outcome.failures()[1].message, "Tags[2] must not be empty");

    let concurrent = validator.validate_async(&profile()).await.unwrap();
    assert_eq!(outcome, concurrent);
}

#[test]
fn test_luhn_checks() {
    let rule = CreditCardRule::new();

    assert!(rule.check("4532015112830366").unwrap().is_valid());
    assert!(rule.check("4532 0151 1283 0366").unwrap().is_valid());
    assert!(!rule.check("4532015112830367").unwrap().is_valid());
    assert!(!rule.check("123").unwrap().is_valid());
}

#[test]
fn test_conditional_chain_is_skipped() {
    let validator = Validator::<Profile>::builder()
        .rule_for("Name", |p| &p.name, |rule| rule.when(|p: &Profile| p.flag).not_empty())
        .build()
        .unwrap();

    let unflagged = Profile { flag: false, ..profile() };
    assert!(validator.validate(&unflagged).unwrap().is_valid());

    let flagged = Profile { flag: true, ..profile() };
    let outcome = validator.validate(&flagged).unwrap();
    assert_eq!(outcome.property_paths(), vec!["Name"]);
}

#[test]
fn test_rule_sets_and_include() {
    let contact = Validator::<Profile>::builder()
        .rule_for("Email", |p| &p.email, |rule| rule.email())
        .rule_set("Strict", |set| {
            set.rule_for("Nickname", |p| &p.nickname, |rule| rule.not_null())
        })
        .build()
        .unwrap();

    let validator = Validator::<Profile>::builder()
        .rule_for("Name", |p| &p.name, |rule| rule.not_empty())
        .include(&contact)
        .rule_set("Strict", |set| set.rule_for("Age", |p| &p.age, |rule| rule.not_null().greater_than(17)))
        .build()
        .unwrap();

    let default = validator.validate(&profile()).unwrap();
    assert_eq!(default.property_paths(), vec!["Name", "Email"]);

    let strict = validator.validate_rule_set(&profile(), "Strict").unwrap();
    assert_eq!(strict.property_paths(), vec!["Nickname", "Age"]);

    let options = ValidationOptions::new().rule_set("default,Strict,Unknown");
    let everything = validator.validate_with(&profile(), &options).unwrap();
    assert_eq!(everything.len(), 4);

    assert!(matches!(
        validator.validate_rule_set(&profile(), "Unknown"),
        Err(ValidatorError::UnknownRuleSet(_))
    ));
}

#[tokio::test]
async fn test_async_only_rule() {
    let validator = Validator::<Profile>::builder()
        .rule_for("Email", |p| &p.email, |rule| {
            rule.must_async(|email: &String| {
                let taken = email == "taken@example.com";
                async move { !taken }
            })
            .with_message("{PropertyName} is already registered")
        })
        .build()
        .unwrap();

    let taken = Profile {
        email: "taken@example.com".to_string(),
        ..profile()
    };

    let err = validator.validate(&taken).unwrap_err();
    assert!(matches!(err, ValidatorError::SyncUnsupported { rule: "must_async" }));

    let outcome = validator.validate_async(&taken).await.unwrap();
    assert_eq!(outcome.failures()[0].message, "Email is already registered");
}

#[tokio::test]
async fn test_predicate_errors_abort_validation() {
    let validator = Validator::<Profile>::builder()
        .rule_for("Name", |p| &p.name, |rule| rule.not_empty())
        .rule_for("Email", |p| &p.email, |rule| {
            rule.try_must(|_| Err::<bool, _>(io::Error::new(io::ErrorKind::Other, "lookup down")))
        })
        .build()
        .unwrap();

    let err = validator.validate(&profile()).unwrap_err();
    assert!(err.is_predicate_error());
    assert!(err.to_string().contains("lookup down"));

    let err = validator.validate_async(&profile()).await.unwrap_err();
    assert!(err.is_predicate_error());
}

#[test]
fn test_custom_rule_reports_relative_paths() {
    let validator = Validator::<Profile>::builder()
        .rule_for("Tags", |p| &p.tags, |rule| {
            rule.custom(|tags, ctx| {
                if tags.len() > 2 {
                    ctx.add_failure(format!("{} allows at most 2 entries", ctx.property_name()));
                }
                if tags.iter().filter(|tag| tag.is_empty()).count() > 1 {
                    ctx.add_failure_at("Blank", "too many blank tags");
                }
            })
        })
        .build()
        .unwrap();

    let outcome = validator.validate(&profile()).unwrap();
    assert_eq!(outcome.property_paths(), vec!["Tags", "Tags.Blank"]);
    assert_eq!(outcome.failures()[0].message, "Tags allows at most 2 entries");
}

#[test]
fn test_severity_and_message_overrides() {
    let validator = Validator::<Profile>::builder()
        .rule_for("Nickname", |p| &p.nickname, |rule| {
            rule.not_empty()
                .with_severity(Severity::Warning)
                .with_message("Consider choosing a {PropertyName}")
        })
        .rule_for("Age", |p| &p.age, |rule| rule.greater_than_or_equal(18).with_message_key("AgeLimit"))
        .build()
        .unwrap();

    let outcome = validator.validate(&profile()).unwrap();
    assert!(!outcome.is_valid());
    assert!(outcome.has_errors());

    let warning = &outcome.failures()[0];
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.message, "Consider choosing a Nickname");

    let age = &outcome.failures()[1];
    assert_eq!(age.error_code.as_deref(), Some("AgeLimit"));
    assert_eq!(age.message, "Age must be greater than or equal to 18");
}

#[test]
fn test_localized_messages() {
    let formatter = CatalogFormatter::new("tr-TR").with_message("tr", "Email", "{PropertyName} alanı hatalı");
    let validator = Validator::<Profile>::builder()
        .rule_for("Name", |p| &p.name, |rule| rule.not_empty())
        .rule_for("Email", |p| &p.email, |rule| rule.email())
        .build()
        .unwrap();

    let options = ValidationOptions::new().formatter(Arc::new(formatter));
    let outcome = validator.validate_with(&profile(), &options).unwrap();

    let messages: Vec<&str> = outcome.failures().iter().map(|f| f.message.as_str()).collect();
    assert_eq!(messages, vec!["Name boş olamaz", "Email alanı hatalı"]);
}

#[test]
fn test_pre_validation_and_registry() {
    let registry = ValidatorRegistry::new();
    registry.register(
        Validator::<Profile>::builder()
            .pre_validate(|p: &Profile| !p.flag)
            .rule_for("Name", |p| &p.name, |rule| rule.not_empty())
            .build()
            .unwrap(),
    );

    assert!(!registry.validate(&profile()).unwrap().is_valid());

    let skipped = Profile { flag: true, ..profile() };
    assert!(registry.validate(&skipped).unwrap().is_valid());
}

#[derive(Debug, Clone)]
struct Listing {
    title: String,
    price: f64,
    contact: String,
    badge: String,
    attachment: String,
    category: String,
    shipping: String,
    country: String,
    photos: Vec<String>,
}

#[derive(Debug)]
enum Category {
    Books,
    Games,
}

impl std::str::FromStr for Category {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, ()> {
        match text {
            "books" => Ok(Category::Books),
            "games" => Ok(Category::Games),
            _ => Err(()),
        }
    }
}

fn listing_validator() -> Validator<Listing> {
    Validator::<Listing>::builder()
        .rule_for("Title", |l| &l.title, |rule| rule.trim(|title| title.not_empty()))
        .rule_for("Price", |l| &l.price, |rule| rule.scale_precision(6, 2))
        .rule_for("Contact", |l| &l.contact, |rule| rule.phone_number())
        .rule_for("Badge", |l| &l.badge, |rule| rule.color(ColorFormat::HEX))
        .rule_for("Attachment", |l| &l.attachment, |rule| rule.allowed_extensions(["pdf", "png"]))
        .rule_for("Category", |l| &l.category, |rule| rule.to_lower(|c| c.is_in_enum::<Category>()))
        .rule_for(
            "Shipping",
            |l| &l.shipping,
            |rule| {
                rule.dependent_on(
                    "Country",
                    |l: &Listing| l.country.clone(),
                    |shipping: &String, country: &String| country == "US" || shipping != "ground",
                )
            },
        )
        .rule_for("Photos", |l| &l.photos, |rule| rule.count_between(1, 3).unique())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_format_and_collection_rules_in_chains() {
    let valid = Listing {
        title: "Dune".to_string(),
        price: 12.99,
        contact: "+1 (555) 010-9999".to_string(),
        badge: "#ffcc00".to_string(),
        attachment: "scan.PDF".to_string(),
        category: "Books".to_string(),
        shipping: "ground".to_string(),
        country: "US".to_string(),
        photos: vec!["front.jpg".to_string()],
    };
    let validator = listing_validator();
    assert!(validator.validate(&valid).unwrap().is_valid());
    assert!(matches!("games".parse::<Category>(), Ok(Category::Games)));

    let invalid = Listing {
        title: "   ".to_string(),
        price: 9.999,
        contact: "12".to_string(),
        badge: "red".to_string(),
        attachment: "setup.exe".to_string(),
        category: "Toys".to_string(),
        country: "CA".to_string(),
        photos: vec!["a.jpg".to_string(), "a.jpg".to_string()],
        ..valid
    };
    let outcome = validator.validate(&invalid).unwrap();
    assert_eq!(
        outcome.property_paths(),
        vec!["Title", "Price", "Contact", "Badge", "Attachment", "Category", "Shipping", "Photos"]
    );
    assert_eq!(
        outcome.failures()[6].message,
        "Shipping is not valid for the given Country"
    );
    assert_eq!(outcome, validator.validate_async(&invalid).await.unwrap());
}

#[test]
fn test_bad_scale_precision_fails_the_build() {
    let result = Validator::<Listing>::builder()
        .rule_for("Price", |l| &l.price, |rule| rule.scale_precision(2, 4))
        .build();
    assert!(matches!(result, Err(ValidatorError::InvalidRuleConfiguration(_))));
}
