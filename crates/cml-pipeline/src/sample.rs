//! Sample inference request for a freshly deployed endpoint.
//!
//! The pipeline never sends it; the CLI prints it for manual testing.

use serde::{Deserialize, Serialize};

pub const FEATURE_COLUMNS: [&str; 14] = [
    "age",
    "credit_card_balance",
    "bank_account_balance",
    "mortgage_balance",
    "primary_loan_balance",
    "sec_bank_account_balance",
    "savings_account_balance",
    "sec_savings_account_balance",
    "secondary_loan_balance",
    "total_est_nworth",
    "college_loan_balance",
    "transaction_amount",
    "latitude",
    "longitude",
];

// Values must stay floats; the model signature rejects integers.
pub const SAMPLE_ROW: [f64; 14] = [
    11.5, 20000.5, 3900.5, 14000.5, 2944.5, 3400.5, 12000.5, 29000.5, 1300.5, 15000.5, 10000.5,
    2000.5, 90.5, 120.5,
];

/// MLflow `dataframe_split` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub dataframe_split: DataframeSplit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataframeSplit {
    pub columns: Vec<String>,
    pub data: Vec<Vec<f64>>,
}

/// The fixed single-row request matching the fraud classifier's features.
#[must_use]
pub fn sample_request() -> InferenceRequest {
    InferenceRequest {
        dataframe_split: DataframeSplit {
            columns: FEATURE_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            data: vec![SAMPLE_ROW.to_vec()],
        },
    }
}
