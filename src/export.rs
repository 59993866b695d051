use crate::models::ContractRecord;

const HEADERS: [&str; 8] = [
    "id", "name", "parties", "status", "risk", "expiry", "category", "value",
];

/// Renders the collection as CSV with a header row. Values containing a
/// quote, comma, or newline are quoted with inner quotes doubled.
pub fn contracts_to_csv(contracts: &[ContractRecord]) -> String {
    let mut lines = vec![HEADERS.join(",")];
    for contract in contracts {
        let fields = [
            escape_csv(&contract.id),
            escape_csv(&contract.name),
            escape_csv(&contract.parties),
            escape_csv(contract.status.as_str()),
            escape_csv(contract.risk.as_str()),
            contract
                .expiry
                .map(|date| date.to_string())
                .unwrap_or_default(),
            escape_csv(contract.category.as_deref().unwrap_or_default()),
            contract
                .value
                .map(|value| value.to_string())
                .unwrap_or_default(),
        ];
        lines.push(fields.join(","));
    }
    lines.join("\n")
}

fn escape_csv(value: &str) -> String {
    if value.contains('"') || value.contains(',') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
