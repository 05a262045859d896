//! Field accessors and rule sets for the request types the service accepts.
use pgw_common::validation::{FieldValue, Rule, Schema, Validate, ValidationConfigError, Validator};

use crate::data_objects::{Amount, Confirmation, NewPayment, NewPayout, PaymentMethodData, PayoutDestination, VatData};

/// Builds the validator for gateway requests, accepting amounts in the given currencies.
pub fn request_validator<I, S>(currencies: I) -> Result<Validator, ValidationConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Validator::builder()
        .currencies(currencies)
        .schema(
            Schema::builder("Amount", ["value", "currency"])
                .tag("value", "required,money")
                .tag("currency", "required,currency"),
        )
        .schema(
            Schema::builder("Confirmation", ["type", "return_url", "locale", "enforce"])
                .tag("type", "required,oneof=embedded external mobile_application qr redirect")
                .tag("ReturnURL", "required_if=Type redirect|mobile_application")
                .tag("ReturnURL", "omitempty,max=2048,url")
                .tag("locale", "omitempty,oneof=ru_RU en_US"),
        )
        .schema(
            Schema::builder("PaymentMethodData", ["type", "phone", "payment_purpose", "vat_data"])
                .rule("type", Rule::Required)
                .rule("phone", Rule::required_if("type", ["mobile_balance"]))
                .rule("phone", Rule::E164)
                .rule("payment_purpose", Rule::required_if("type", ["b2b_sberbank"]))
                .rule("payment_purpose", Rule::Max(210))
                .rule("vat_data", Rule::required_if("type", ["b2b_sberbank"])),
        )
        .schema(
            Schema::builder("VatData", ["type", "amount", "rate"])
                .tag("type", "required,oneof=untaxed calculated mixed")
                .tag("amount", "required_if=Type calculated|mixed")
                .tag("rate", "required_if=Type calculated"),
        )
        .schema(
            Schema::builder("PayoutDestination", ["type", "card", "bank_id", "phone", "account_number"])
                .tag("type", "required,oneof=bank_card sbp yoo_money")
                .tag("type", "should_exist_field=bank_card:card sbp:bank_id sbp:phone yoo_money:account_number")
                .rule("card", Rule::omit_with("type", ["bank_card"]))
                .rule("bank_id", Rule::omit_with("type", ["sbp"]))
                .rule("phone", Rule::omit_with("type", ["sbp"]))
                .rule("account_number", Rule::omit_with("type", ["yoo_money"]))
                .tag("phone", "omitempty,e164")
                .tag("AccountNumber", "omitempty,min=11,max=33,numeric"),
        )
        .schema(Schema::builder("NewPayment", ["amount", "confirmation", "payment_method_data"]))
        .schema(Schema::builder("NewPayout", ["amount", "payout_token", "payout_destination_data"]))
        .build()
}

impl Validate for Amount {
    fn schema_name(&self) -> &'static str {
        "Amount"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "value" => FieldValue::from(&self.value),
            "currency" => FieldValue::from(&self.currency),
            _ => FieldValue::Absent,
        }
    }
}

impl Validate for Confirmation {
    fn schema_name(&self) -> &'static str {
        "Confirmation"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "type" => FieldValue::from(&self.kind),
            "return_url" => FieldValue::from(&self.return_url),
            "locale" => FieldValue::from(&self.locale),
            "enforce" => FieldValue::from(self.enforce),
            _ => FieldValue::Absent,
        }
    }
}

impl Validate for VatData {
    fn schema_name(&self) -> &'static str {
        "VatData"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "type" => FieldValue::from(&self.kind),
            "amount" => FieldValue::presence(&self.amount),
            "rate" => FieldValue::from(&self.rate),
            _ => FieldValue::Absent,
        }
    }

    fn children(&self) -> Vec<(&'static str, &dyn Validate)> {
        self.amount.iter().map(|a| ("amount", a as &dyn Validate)).collect()
    }
}

impl Validate for PaymentMethodData {
    fn schema_name(&self) -> &'static str {
        "PaymentMethodData"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "type" => FieldValue::from(&self.kind),
            "phone" => FieldValue::from(&self.phone),
            "payment_purpose" => FieldValue::from(&self.payment_purpose),
            "vat_data" => FieldValue::presence(&self.vat_data),
            _ => FieldValue::Absent,
        }
    }

    fn children(&self) -> Vec<(&'static str, &dyn Validate)> {
        self.vat_data.iter().map(|v| ("vat_data", v as &dyn Validate)).collect()
    }
}

impl Validate for PayoutDestination {
    fn schema_name(&self) -> &'static str {
        "PayoutDestination"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "type" => FieldValue::from(&self.kind),
            "card" => FieldValue::presence(&self.card),
            "bank_id" => FieldValue::from(&self.bank_id),
            "phone" => FieldValue::from(&self.phone),
            "account_number" => FieldValue::from(&self.account_number),
            _ => FieldValue::Absent,
        }
    }
}

impl Validate for NewPayment {
    fn schema_name(&self) -> &'static str {
        "NewPayment"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "amount" => FieldValue::Present,
            "confirmation" => FieldValue::presence(&self.confirmation),
            "payment_method_data" => FieldValue::presence(&self.payment_method_data),
            _ => FieldValue::Absent,
        }
    }

    fn children(&self) -> Vec<(&'static str, &dyn Validate)> {
        let mut children: Vec<(&'static str, &dyn Validate)> = vec![("amount", &self.amount)];
        if let Some(c) = &self.confirmation {
            children.push(("confirmation", c));
        }
        if let Some(m) = &self.payment_method_data {
            children.push(("payment_method_data", m));
        }
        children
    }
}

impl Validate for NewPayout {
    fn schema_name(&self) -> &'static str {
        "NewPayout"
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "amount" => FieldValue::Present,
            "payout_token" => FieldValue::from(&self.payout_token),
            "payout_destination_data" => FieldValue::presence(&self.payout_destination_data),
            _ => FieldValue::Absent,
        }
    }

    fn children(&self) -> Vec<(&'static str, &dyn Validate)> {
        let mut children: Vec<(&'static str, &dyn Validate)> = vec![("amount", &self.amount)];
        if let Some(d) = &self.payout_destination_data {
            children.push(("payout_destination_data", d));
        }
        children
    }
}
