//! Descriptors for the REST resources of the practice back office.
//!
//! A [`Resource`] ties a collection path to the schema its forms validate
//! against and to the fields used to render a record's display name (the
//! name typed to confirm a delete).

use serde_json::json;

use crate::entity::EntityRecord;
use crate::schema::Schema;
use crate::schema::patterns::{HEX_COLOR, SAUDI_IBAN, SAUDI_NATIONAL_ID};

pub const CONTACT_TYPES: &[&str] = &[
    "individual",
    "organization",
    "court",
    "attorney",
    "expert",
    "government",
    "other",
];

pub const CONTACT_STATUSES: &[&str] = &["active", "inactive", "archived", "deceased"];

pub const PAYMENT_METHODS: &[&str] = &["cash", "bank_transfer", "check", "card", "other"];

pub const PLAN_TYPES: &[&str] = &[
    "retainer",
    "hourly_package",
    "flat_fee",
    "hybrid",
    "compliance",
    "document_review",
    "advisory",
];

pub const BILLING_PERIODS: &[&str] = &[
    "weekly",
    "biweekly",
    "monthly",
    "quarterly",
    "semi_annually",
    "annually",
];

pub const CURRENCIES: &[&str] = &["SAR", "USD", "EUR", "GBP", "AED"];

/// A REST collection and the rules for editing its records
#[derive(Debug, Clone)]
pub struct Resource {
    name: String,
    path: String,
    display_fields: Vec<String>,
    schema: Schema,
    idempotent_create: bool,
}

impl Resource {
    /// A resource at `path` (relative to the API base URL) with an empty schema
    pub fn new(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.trim_matches('/').to_string(),
            display_fields: vec!["name".to_string()],
            schema: Schema::default(),
            idempotent_create: false,
        }
    }

    pub fn with_display_fields(mut self, fields: &[&str]) -> Self {
        self.display_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Send an idempotency key with every create
    pub fn with_idempotent_create(mut self) -> Self {
        self.idempotent_create = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn idempotent_create(&self) -> bool {
        self.idempotent_create
    }

    /// Human-readable name of a record: the non-blank display fields joined
    /// by a space, or the record id when all of them are blank.
    pub fn display_name(&self, record: &EntityRecord) -> String {
        let parts: Vec<&str> = self
            .display_fields
            .iter()
            .filter_map(|field| record.get_str(field))
            .collect();
        if parts.is_empty() {
            record.id().to_string()
        } else {
            parts.join(" ")
        }
    }

    pub fn contacts() -> Self {
        let schema = Schema::builder()
            .field("firstName", |f| f.required().max_len(100))
            .field("lastName", |f| f.required().max_len(100))
            .field("firstNameAr", |f| f.max_len(100))
            .field("lastNameAr", |f| f.max_len(100))
            .field("email", |f| f.email())
            .field("phone", |f| f.phone())
            .field("nationalId", |f| {
                f.pattern(&SAUDI_NATIONAL_ID, "must be a valid national ID")
            })
            .field("company", |f| f.max_len(200))
            .field("type", |f| {
                f.one_of(CONTACT_TYPES).default_value(json!("individual"))
            })
            .field("status", |f| {
                f.one_of(CONTACT_STATUSES).default_value(json!("active"))
            })
            .field("notes", |f| f.max_len(2000))
            .build();

        Self::new("contacts", "contacts")
            .with_display_fields(&["firstName", "lastName"])
            .with_schema(schema)
    }

    pub fn payments() -> Self {
        let schema = Schema::builder()
            .field("amount", |f| f.required().min(0.01))
            .field("paymentMethod", |f| {
                f.required()
                    .one_of(PAYMENT_METHODS)
                    .default_value(json!("bank_transfer"))
            })
            .field("paymentDate", |f| f.required().date())
            .field("referenceNumber", |f| f.max_len(100))
            .field("clientId", |f| f.required())
            .field("invoiceId", |f| f.max_len(64))
            .field("iban", |f| f.pattern(&SAUDI_IBAN, "must be a valid Saudi IBAN"))
            .field("notes", |f| f.max_len(1000))
            .build();

        Self::new("payments", "payments")
            .with_display_fields(&["referenceNumber"])
            .with_schema(schema)
            .with_idempotent_create()
    }

    pub fn subscription_plans() -> Self {
        let schema = Schema::builder()
            .field("name", |f| f.required().max_len(100))
            .field("nameAr", |f| f.max_len(100))
            .field("planType", |f| {
                f.required()
                    .one_of(PLAN_TYPES)
                    .default_value(json!("retainer"))
            })
            .field("billingPeriod", |f| {
                f.required()
                    .one_of(BILLING_PERIODS)
                    .default_value(json!("monthly"))
            })
            .field("amount", |f| f.required().min(0.0))
            .field("currency", |f| {
                f.required().one_of(CURRENCIES).default_value(json!("SAR"))
            })
            .field("includedHours", |f| f.min(0.0))
            .field("trialDays", |f| {
                f.integer().min(0.0).default_value(json!(0))
            })
            .field("invoiceDaysBefore", |f| {
                f.integer().min(0.0).max(30.0).default_value(json!(7))
            })
            .field("isActive", |f| f.boolean().default_value(json!(true)))
            .build();

        Self::new("subscription_plans", "subscription-plans")
            .with_display_fields(&["name"])
            .with_schema(schema)
    }

    pub fn crm_tags() -> Self {
        let schema = Schema::builder()
            .field("name", |f| f.required().max_len(50))
            .field("nameAr", |f| f.max_len(50))
            .field("color", |f| {
                f.pattern(&HEX_COLOR, "must be a color like #1E40AF")
                    .default_value(json!("#3B82F6"))
            })
            .build();

        Self::new("crm_tags", "crm/tags")
            .with_display_fields(&["name"])
            .with_schema(schema)
    }
}
