use tracing::debug;

use super::context::ImportContext;
use super::{ImportCause, PhaseInput, RunReport, name_or_placeholder};
use crate::legacy::LegacyCustomer;
use crate::store::customers::NewCustomer;

pub(super) async fn import(
    input: &PhaseInput<'_>,
    ctx: &mut ImportContext,
    report: &mut RunReport,
) -> Result<(), ImportCause> {
    for legacy in &input.snapshot.customers {
        let draft = draft(input, legacy, report);
        match draft.insert(input.db).await {
            Ok(customer) => {
                debug!(name = %customer.name, legacy_id = legacy.customer_id, "Created customer");
                ctx.customers.insert(legacy.customer_id, customer.id);
                report.customers += 1;
            }
            Err(err) => {
                input.on_store_error(err, report)?;
                ctx.dropped_customers.insert(legacy.customer_id);
            }
        }
    }
    Ok(())
}

fn draft(input: &PhaseInput<'_>, legacy: &LegacyCustomer, report: &mut RunReport) -> NewCustomer {
    let (name, synthesized) = name_or_placeholder(legacy.name.as_deref(), "customer", report);
    let timezone = legacy
        .timezone
        .as_deref()
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| input.options.timezone.name().to_string());

    NewCustomer {
        name,
        company: legacy.company.clone(),
        contact: legacy.contact.clone(),
        address: address(legacy),
        country: input.options.country.clone(),
        currency: input.options.currency.clone(),
        timezone,
        email: legacy.mail.clone(),
        phone: legacy.phone.clone(),
        fax: legacy.fax.clone(),
        mobile: legacy.mobile.clone(),
        homepage: legacy.homepage.clone(),
        comment: legacy.comment.clone(),
        visible: legacy.visible != 0 && legacy.trash == 0,
        synthesized,
    }
}

/// `street\nzipcode city`, or `None` when all parts are empty.
fn address(legacy: &LegacyCustomer) -> Option<String> {
    let part = |p: &Option<String>| p.as_deref().unwrap_or_default().trim().to_string();
    let address = format!(
        "{}\n{} {}",
        part(&legacy.street),
        part(&legacy.zipcode),
        part(&legacy.city)
    );
    let address = address.trim().to_string();
    (!address.is_empty()).then_some(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_layout() {
        let legacy = LegacyCustomer {
            street: Some("Main St 1".into()),
            zipcode: Some("12345".into()),
            city: Some("Springfield".into()),
            ..Default::default()
        };
        assert_eq!(address(&legacy).as_deref(), Some("Main St 1\n12345 Springfield"));
        assert_eq!(address(&LegacyCustomer::default()), None);
    }
}
