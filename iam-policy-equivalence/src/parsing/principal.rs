//! AWS principal identifier normalization

/// Return the account id when `identifier` is an account root ARN
/// (`arn:<partition>:iam::<account>:root`)
pub(crate) fn account_root_id(identifier: &str) -> Option<&str> {
    // ARN format: arn:partition:service:region:account:resource
    let parts: Vec<&str> = identifier.splitn(6, ':').collect();
    if parts.len() < 6 {
        return None;
    }
    let (prefix, partition, service, region, account, resource) =
        (parts[0], parts[1], parts[2], parts[3], parts[4], parts[5]);
    if prefix != "arn" || partition.is_empty() || service != "iam" || !region.is_empty() {
        return None;
    }
    if resource != "root" || !is_account_id(account) {
        return None;
    }
    Some(account)
}

/// AWS account ids are exactly twelve ASCII digits
pub(crate) fn is_account_id(value: &str) -> bool {
    value.len() == 12 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Collapse an `AWS` principal identifier to its canonical spelling
pub(crate) fn normalize_aws_identifier(identifier: String) -> String {
    match account_root_id(&identifier) {
        Some(account) => {
            log::trace!("Normalized account root principal {identifier} to {account}");
            account.to_string()
        }
        None => identifier,
    }
}
