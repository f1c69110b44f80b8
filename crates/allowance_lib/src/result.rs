use crate::config::ChainId;
use crate::utils::U256ConvExt;
use rust_decimal::Decimal;
use serde::Serialize;
use web3::types::U256;

/// Fractional digits shown to the user
pub const DISPLAY_PRECISION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u32,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u32) -> Self {
        Self { raw, decimals }
    }

    pub fn to_display_string(&self) -> String {
        self.raw.to_rounded_str(self.decimals, DISPLAY_PRECISION)
    }

    pub fn to_decimal_saturate(&self) -> Decimal {
        self.raw.to_decimal_saturate(self.decimals)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAmounts {
    pub balance: TokenAmount,
    pub allowance: TokenAmount,
    pub available: TokenAmount,
    pub block_number: u64,
    pub endpoint: String,
}

impl ResolvedAmounts {
    pub fn new(
        balance: U256,
        allowance: U256,
        decimals: u32,
        block_number: u64,
        endpoint: String,
    ) -> Self {
        Self {
            balance: TokenAmount::new(balance, decimals),
            allowance: TokenAmount::new(allowance, decimals),
            available: TokenAmount::new(std::cmp::min(balance, allowance), decimals),
            block_number,
            endpoint,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllowanceStatus {
    Resolved(ResolvedAmounts),
    Failed { error: String },
}

/// Outcome of one (address, chain) lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "AllowanceResultView")]
pub struct AllowanceResult {
    pub address: String,
    pub chain: ChainId,
    pub status: AllowanceStatus,
}

impl AllowanceResult {
    pub fn resolved(address: &str, chain: ChainId, amounts: ResolvedAmounts) -> Self {
        Self {
            address: address.to_string(),
            chain,
            status: AllowanceStatus::Resolved(amounts),
        }
    }

    pub fn failed(address: &str, chain: ChainId, error: String) -> Self {
        Self {
            address: address.to_string(),
            chain,
            status: AllowanceStatus::Failed { error },
        }
    }

    pub fn amounts(&self) -> Option<&ResolvedAmounts> {
        match &self.status {
            AllowanceStatus::Resolved(amounts) => Some(amounts),
            AllowanceStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            AllowanceStatus::Resolved(_) => None,
            AllowanceStatus::Failed { error } => Some(error),
        }
    }

    pub fn balance(&self) -> String {
        self.display(|amounts| &amounts.balance)
    }

    pub fn allowance(&self) -> String {
        self.display(|amounts| &amounts.allowance)
    }

    pub fn available(&self) -> String {
        self.display(|amounts| &amounts.available)
    }

    fn display(&self, field: impl Fn(&ResolvedAmounts) -> &TokenAmount) -> String {
        self.amounts()
            .map(|amounts| field(amounts).to_display_string())
            .unwrap_or_else(|| "0".to_string())
    }
}

/// Shape handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowanceResultView {
    pub address: String,
    pub chain: ChainId,
    pub balance: String,
    pub allowance: String,
    pub available: String,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl From<AllowanceResult> for AllowanceResultView {
    fn from(result: AllowanceResult) -> Self {
        AllowanceResultView {
            balance: result.balance(),
            allowance: result.allowance(),
            available: result.available(),
            error: result.error().map(|e| e.to_string()),
            block_number: result.amounts().map(|a| a.block_number),
            endpoint: result.amounts().map(|a| a.endpoint.clone()),
            address: result.address,
            chain: result.chain,
        }
    }
}
