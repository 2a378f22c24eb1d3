//! Test data builders

use rotation_core::models::{LeadForm, NewDealer};

/// Builder for dealer registrations
pub struct DealerBuilder {
    dealer: NewDealer,
}

impl DealerBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            dealer: NewDealer {
                id: id.to_string(),
                display_name: format!("Dealer {id}"),
                contact_channel: format!("{id}@dealers.example.com"),
                avatar_ref: None,
            },
        }
    }

    pub fn with_display_name(mut self, display_name: &str) -> Self {
        self.dealer.display_name = display_name.to_string();
        self
    }

    pub fn with_contact_channel(mut self, contact_channel: &str) -> Self {
        self.dealer.contact_channel = contact_channel.to_string();
        self
    }

    pub fn with_avatar(mut self, avatar_ref: &str) -> Self {
        self.dealer.avatar_ref = Some(avatar_ref.to_string());
        self
    }

    pub fn build(self) -> NewDealer {
        self.dealer
    }
}

/// Builder for lead forms, complete by default
pub struct LeadFormBuilder {
    form: LeadForm,
}

impl LeadFormBuilder {
    pub fn new() -> Self {
        Self {
            form: LeadForm {
                full_name: "Dana Levi".to_string(),
                id_number: "123456782".to_string(),
                email: "dana.levi@example.com".to_string(),
                phone: "+972-50-123-4567".to_string(),
                agreement_accepted: true,
            },
        }
    }

    pub fn with_full_name(mut self, full_name: &str) -> Self {
        self.form.full_name = full_name.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.form.email = email.to_string();
        self
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.form.phone = phone.to_string();
        self
    }

    pub fn without_agreement(mut self) -> Self {
        self.form.agreement_accepted = false;
        self
    }

    pub fn build(self) -> LeadForm {
        self.form
    }
}

impl Default for LeadFormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 生成 `count` 个按顺序编号的经销商注册信息（d0, d1, ...）
pub fn numbered_dealers(count: usize) -> Vec<NewDealer> {
    (0..count)
        .map(|i| DealerBuilder::new(&format!("d{i}")).build())
        .collect()
}
