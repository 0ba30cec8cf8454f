//! Edit forms shown as overlays.
//!
//! A `Form` is a flat list of labelled fields plus a save button. It knows
//! how to build itself from a model and how to write its values back; the
//! `App` decides what saving means for each `FormKind`.

use orcaflow_core::contacts::{custom_fields_text, parse_custom_fields};
use orcaflow_core::models::{
    AgentFeatures, BrandSettings, Contact, ContactStatus, CustomAgentSettings, DateFormat,
    Language, SystemSettings,
};

/// Maximum characters in any single form field.
const MAX_FIELD_LENGTH: usize = 500;

/// Providers offered for the bring-your-own agent.
pub const AGENT_PROVIDERS: [&str; 5] = ["Google Gemini", "OpenAI", "Anthropic", "Mistral", "Custom"];

/// Platforms a page can be connected from.
pub const CONNECT_PLATFORMS: [&str; 3] = ["facebook", "instagram", "gmail"];

const ON: &str = "on";
const OFF: &str = "off";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Typed like text, rendered masked
    Secret,
    /// One of a fixed set of values, changed with ←/→ or Space
    Choice(Vec<&'static str>),
    Toggle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub kind: FieldKind,
}

impl FormField {
    fn text(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind: FieldKind::Text,
        }
    }

    fn secret(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            kind: FieldKind::Secret,
        }
    }

    fn choice(label: &'static str, value: &str, options: Vec<&'static str>) -> Self {
        let value = if options.iter().any(|o| *o == value) {
            value.to_string()
        } else {
            options.first().copied().unwrap_or_default().to_string()
        };
        Self {
            label,
            value,
            kind: FieldKind::Choice(options),
        }
    }

    fn toggle(label: &'static str, on: bool) -> Self {
        Self {
            label,
            value: if on { ON } else { OFF }.to_string(),
            kind: FieldKind::Toggle,
        }
    }

    pub fn is_editable_text(&self) -> bool {
        matches!(self.kind, FieldKind::Text | FieldKind::Secret)
    }

    pub fn is_on(&self) -> bool {
        self.value == ON
    }

    /// Step a choice or flip a toggle. Text fields are left alone.
    pub fn cycle(&mut self, forward: bool) {
        match self.kind {
            FieldKind::Choice(ref options) if !options.is_empty() => {
                let idx = options.iter().position(|o| *o == self.value).unwrap_or(0);
                let next = if forward {
                    (idx + 1) % options.len()
                } else {
                    (idx + options.len() - 1) % options.len()
                };
                self.value = options[next].to_string();
            }
            FieldKind::Toggle => {
                let on = self.is_on();
                self.value = if on { OFF } else { ON }.to_string();
            }
            _ => {}
        }
    }
}

/// What a form edits, and so what saving it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    NewContact,
    EditContact(i64),
    /// Brand voice and system settings, saved to the tenant together
    Brand,
    CustomAgent,
    ConnectPage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub fields: Vec<FormField>,
    /// Index into `fields`; `fields.len()` is the save button.
    pub focus: usize,
    pub error: Option<String>,
    pub submitting: bool,
}

impl Form {
    fn new(kind: FormKind, fields: Vec<FormField>) -> Self {
        Self {
            kind,
            fields,
            focus: 0,
            error: None,
            submitting: false,
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            FormKind::NewContact => " New Contact ",
            FormKind::EditContact(_) => " Edit Contact ",
            FormKind::Brand => " Brand & System Settings ",
            FormKind::CustomAgent => " Custom Agent ",
            FormKind::ConnectPage => " Connect Page ",
        }
    }

    pub fn button_label(&self) -> &'static str {
        match self.kind {
            FormKind::ConnectPage => "Connect",
            _ => "Save",
        }
    }

    // ===== Builders =====

    pub fn contact(contact: Option<&Contact>) -> Self {
        let blank = Contact::default();
        let c = contact.unwrap_or(&blank);
        let kind = match contact {
            Some(c) => FormKind::EditContact(c.id),
            None => FormKind::NewContact,
        };
        let statuses = ContactStatus::ALL.iter().map(|s| s.as_str()).collect();

        Self::new(
            kind,
            vec![
                FormField::text("First name", c.first_name.clone()),
                FormField::text("Last name", c.last_name.clone()),
                FormField::text("Email", c.email.clone()),
                FormField::text("Phone", c.phone.clone()),
                FormField::text("Company", c.company.clone()),
                FormField::text("Role", c.role.clone()),
                FormField::choice("Status", c.status.as_str(), statuses),
                FormField::text("Notes", c.notes.clone()),
                FormField::text("Custom fields", custom_fields_text(&c.custom_fields)),
            ],
        )
    }

    pub fn brand(brand: &BrandSettings, system: &SystemSettings) -> Self {
        let languages = Language::ALL.iter().map(|l| l.label()).collect();
        let formats = DateFormat::ALL.iter().map(|f| f.label()).collect();

        Self::new(
            FormKind::Brand,
            vec![
                FormField::text("Industry", brand.industry.clone()),
                FormField::text("Target audience", brand.target_audience.clone()),
                FormField::text("Offerings", brand.offerings.clone()),
                FormField::text("Archetype", brand.archetype.clone()),
                FormField::text("Tone", brand.tone.clone()),
                FormField::choice("Language", brand.default_language.label(), languages),
                FormField::text("Exemplar", brand.exemplar.clone()),
                FormField::text("Forbidden words", brand.keywords_csv()),
                FormField::text("Business name", system.business_name.clone()),
                FormField::text("Timezone", system.timezone.clone()),
                FormField::choice("Date format", system.date_format.label(), formats),
                FormField::text("Currency", system.currency.clone()),
            ],
        )
    }

    pub fn custom_agent(agent: &CustomAgentSettings) -> Self {
        Self::new(
            FormKind::CustomAgent,
            vec![
                FormField::choice("Provider", &agent.platform, AGENT_PROVIDERS.to_vec()),
                FormField::secret("API key", agent.api_key.clone()),
                FormField::toggle("Planner agent", agent.features.planner),
                FormField::toggle("Chat agent", agent.features.chat),
            ],
        )
    }

    pub fn connect_page() -> Self {
        Self::new(
            FormKind::ConnectPage,
            vec![
                FormField::choice("Platform", CONNECT_PLATFORMS[0], CONNECT_PLATFORMS.to_vec()),
                FormField::secret("Access token", ""),
            ],
        )
    }

    // ===== Reading values back =====

    pub fn value(&self, label: &str) -> &str {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
            .unwrap_or("")
    }

    fn trimmed(&self, label: &str) -> String {
        self.value(label).trim().to_string()
    }

    /// Apply the contact fields on top of `base`, which keeps id and history.
    pub fn to_contact(&self, base: Contact) -> Contact {
        let status = ContactStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == self.value("Status"))
            .unwrap_or_default();

        Contact {
            first_name: self.trimmed("First name"),
            last_name: self.trimmed("Last name"),
            email: self.trimmed("Email"),
            phone: self.trimmed("Phone"),
            company: self.trimmed("Company"),
            role: self.trimmed("Role"),
            status,
            notes: self.value("Notes").to_string(),
            custom_fields: parse_custom_fields(self.value("Custom fields")),
            ..base
        }
    }

    pub fn apply_brand(&self, brand: &mut BrandSettings, system: &mut SystemSettings) {
        brand.industry = self.trimmed("Industry");
        brand.target_audience = self.trimmed("Target audience");
        brand.offerings = self.trimmed("Offerings");
        brand.archetype = self.trimmed("Archetype");
        brand.tone = self.trimmed("Tone");
        if let Some(language) = Language::from_label(self.value("Language")) {
            brand.default_language = language;
        }
        brand.exemplar = self.trimmed("Exemplar");
        brand.set_keywords_csv(self.value("Forbidden words"));

        system.business_name = self.trimmed("Business name");
        system.timezone = self.trimmed("Timezone");
        if let Some(format) = DateFormat::from_label(self.value("Date format")) {
            system.date_format = format;
        }
        system.currency = self.trimmed("Currency");
    }

    pub fn to_custom_agent(&self) -> CustomAgentSettings {
        let on = |label: &str| self.fields.iter().any(|f| f.label == label && f.is_on());
        CustomAgentSettings {
            platform: self.value("Provider").to_string(),
            api_key: self.trimmed("API key"),
            features: AgentFeatures {
                planner: on("Planner agent"),
                chat: on("Chat agent"),
            },
        }
    }

    // ===== Editing =====

    pub fn on_button(&self) -> bool {
        self.focus >= self.fields.len()
    }

    pub fn focused_field(&self) -> Option<&FormField> {
        self.fields.get(self.focus)
    }

    fn focused_field_mut(&mut self) -> Option<&mut FormField> {
        self.fields.get_mut(self.focus)
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        let stops = self.fields.len() + 1;
        self.focus = (self.focus + stops - 1) % stops;
    }

    pub fn type_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        if let Some(field) = self.focused_field_mut() {
            if field.is_editable_text() && field.value.chars().count() < MAX_FIELD_LENGTH {
                field.value.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.focused_field_mut() {
            if field.is_editable_text() {
                field.value.pop();
            }
        }
    }

    pub fn cycle_focused(&mut self, forward: bool) {
        if let Some(field) = self.focused_field_mut() {
            field.cycle(forward);
        }
    }
}
