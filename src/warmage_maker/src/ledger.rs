use crate::numeric::Coin;
use candid::{CandidType, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(CandidType, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LedgerAccount {
    User(Principal),
    Module(String),
}

impl fmt::Display for LedgerAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerAccount::User(principal) => write!(f, "{}", principal),
            LedgerAccount::Module(name) => write!(f, "module:{}", name),
        }
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerError {
    InsufficientFunds {
        account: LedgerAccount,
        required: Coin,
        balance: u128,
    },
    InvalidDenom(String),
    Overflow(Coin),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InsufficientFunds {
                account,
                required,
                balance,
            } => write!(
                f,
                "insufficient funds in {}: required {}, balance {}",
                account, required, balance
            ),
            LedgerError::InvalidDenom(denom) => write!(f, "invalid denomination: '{}'", denom),
            LedgerError::Overflow(coin) => write!(f, "balance overflow adding {}", coin),
        }
    }
}

#[derive(CandidType, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOp {
    SendFromAccountToModule {
        from: Principal,
        module: String,
        coins: Vec<Coin>,
    },
    SendFromModuleToAccount {
        module: String,
        to: Principal,
        coins: Vec<Coin>,
    },
    SendFromModuleToModule {
        from: String,
        to: String,
        coins: Vec<Coin>,
    },
    MintCoins {
        module: String,
        coins: Vec<Coin>,
    },
    BurnCoins {
        module: String,
        coins: Vec<Coin>,
    },
}

/// Token bookkeeping the engine moves funds through.
pub trait Ledger {
    fn balance(&self, account: &LedgerAccount, denom: &str) -> u128;

    /// Applies every operation or none of them.
    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError>;
}

/// Ordered list of ledger movements for one transaction. Zero-amount coins
/// are dropped and empty movements are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerBatch {
    ops: Vec<LedgerOp>,
}

impl LedgerBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn send_to_module(&mut self, from: Principal, module: &str, coins: &[Coin]) -> &mut Self {
        let coins = non_zero(coins);
        if !coins.is_empty() {
            self.ops.push(LedgerOp::SendFromAccountToModule {
                from,
                module: module.to_string(),
                coins,
            });
        }
        self
    }

    pub fn send_to_account(&mut self, module: &str, to: Principal, coins: &[Coin]) -> &mut Self {
        let coins = non_zero(coins);
        if !coins.is_empty() {
            self.ops.push(LedgerOp::SendFromModuleToAccount {
                module: module.to_string(),
                to,
                coins,
            });
        }
        self
    }

    pub fn send_between_modules(&mut self, from: &str, to: &str, coins: &[Coin]) -> &mut Self {
        let coins = non_zero(coins);
        if !coins.is_empty() {
            self.ops.push(LedgerOp::SendFromModuleToModule {
                from: from.to_string(),
                to: to.to_string(),
                coins,
            });
        }
        self
    }

    pub fn mint(&mut self, module: &str, coins: &[Coin]) -> &mut Self {
        let coins = non_zero(coins);
        if !coins.is_empty() {
            self.ops.push(LedgerOp::MintCoins {
                module: module.to_string(),
                coins,
            });
        }
        self
    }

    pub fn burn(&mut self, module: &str, coins: &[Coin]) -> &mut Self {
        let coins = non_zero(coins);
        if !coins.is_empty() {
            self.ops.push(LedgerOp::BurnCoins {
                module: module.to_string(),
                coins,
            });
        }
        self
    }

    pub fn ops(&self) -> &[LedgerOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn non_zero(coins: &[Coin]) -> Vec<Coin> {
    coins.iter().filter(|coin| coin.is_positive()).cloned().collect()
}

/// Balances kept in memory. Used by tests and by hosts that settle the
/// ledger elsewhere.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryLedger {
    balances: BTreeMap<(LedgerAccount, String), u128>,
    supply: BTreeMap<String, u128>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credits an account with freshly issued coins.
    pub fn fund(&mut self, account: LedgerAccount, coin: Coin) -> Result<(), LedgerError> {
        self.increase_supply(&coin)?;
        self.credit(account, &coin)
    }

    pub fn supply(&self, denom: &str) -> u128 {
        self.supply.get(denom).copied().unwrap_or_default()
    }

    fn credit(&mut self, account: LedgerAccount, coin: &Coin) -> Result<(), LedgerError> {
        check_denom(&coin.denom)?;
        let balance = self.balances.entry((account, coin.denom.clone())).or_default();
        *balance = balance
            .checked_add(coin.amount)
            .ok_or_else(|| LedgerError::Overflow(coin.clone()))?;
        Ok(())
    }

    fn debit(&mut self, account: LedgerAccount, coin: &Coin) -> Result<(), LedgerError> {
        check_denom(&coin.denom)?;
        let balance = self.balance(&account, &coin.denom);
        let remaining = balance
            .checked_sub(coin.amount)
            .ok_or_else(|| LedgerError::InsufficientFunds {
                account: account.clone(),
                required: coin.clone(),
                balance,
            })?;
        self.balances.insert((account, coin.denom.clone()), remaining);
        Ok(())
    }

    fn increase_supply(&mut self, coin: &Coin) -> Result<(), LedgerError> {
        check_denom(&coin.denom)?;
        let supply = self.supply.entry(coin.denom.clone()).or_default();
        *supply = supply
            .checked_add(coin.amount)
            .ok_or_else(|| LedgerError::Overflow(coin.clone()))?;
        Ok(())
    }

    fn decrease_supply(&mut self, coin: &Coin) {
        if let Some(supply) = self.supply.get_mut(&coin.denom) {
            *supply = supply.saturating_sub(coin.amount);
        }
    }

    fn transfer(&mut self, from: LedgerAccount, to: LedgerAccount, coins: &[Coin]) -> Result<(), LedgerError> {
        for coin in coins {
            self.debit(from.clone(), coin)?;
            self.credit(to.clone(), coin)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, op: &LedgerOp) -> Result<(), LedgerError> {
        match op {
            LedgerOp::SendFromAccountToModule { from, module, coins } => self.transfer(
                LedgerAccount::User(*from),
                LedgerAccount::Module(module.clone()),
                coins,
            ),
            LedgerOp::SendFromModuleToAccount { module, to, coins } => self.transfer(
                LedgerAccount::Module(module.clone()),
                LedgerAccount::User(*to),
                coins,
            ),
            LedgerOp::SendFromModuleToModule { from, to, coins } => self.transfer(
                LedgerAccount::Module(from.clone()),
                LedgerAccount::Module(to.clone()),
                coins,
            ),
            LedgerOp::MintCoins { module, coins } => {
                for coin in coins {
                    self.increase_supply(coin)?;
                    self.credit(LedgerAccount::Module(module.clone()), coin)?;
                }
                Ok(())
            }
            LedgerOp::BurnCoins { module, coins } => {
                for coin in coins {
                    self.debit(LedgerAccount::Module(module.clone()), coin)?;
                    self.decrease_supply(coin);
                }
                Ok(())
            }
        }
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, account: &LedgerAccount, denom: &str) -> u128 {
        self.balances
            .get(&(account.clone(), denom.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn apply(&mut self, ops: &[LedgerOp]) -> Result<(), LedgerError> {
        let mut staged = self.clone();
        for op in ops {
            staged.apply_one(op)?;
        }
        *self = staged;
        Ok(())
    }
}

fn check_denom(denom: &str) -> Result<(), LedgerError> {
    if denom.is_empty() || !denom.chars().all(|c| c.is_ascii_alphanumeric() || c == '/') {
        return Err(LedgerError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}
