//! Trading Account Registry
//!
//! Orchestrates account provisioning, status toggling, email
//! reassignment and demo-pool assignment maintenance across the two
//! broker platforms. The remote services stay the source of truth; this
//! module sequences the calls and their side effects (credential
//! blanking, uniqueness checks, audit records).

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::providers::{
    generate_account_password, AccountStore, BrokerApi, CreateMttAccount, DemoAccount,
    DemoAccountPatch, Mt5AccountUpdate, MttAccount, MttPersonalDetails, NewMt5Account,
    NewTradingAccount, PortalStore, ProviderError, StoredMttAccount, StoredMttTradingAccount,
    TradingAccountOptions,
};
use crate::types::{AccountStatus, AuditAction, AuditRecord, PlatformKind, TradingAccount};

/// Reserved pool holder for entries pulled from circulation
pub const VOID_USER: &str = "VOID_USER";

/// Registry operation failures
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No demo accounts available. Please join our waiting list.")]
    NoAccountsAvailable,

    #[error("Email is already in use by another account")]
    EmailInUse,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Orchestration layer over the account providers
pub struct Registry {
    accounts: Arc<dyn AccountStore>,
    broker: Arc<dyn BrokerApi>,
    store: Arc<dyn PortalStore>,
    /// Challenge every MTT demo trading account is created on
    demo_challenge_id: String,
}

impl Registry {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        broker: Arc<dyn BrokerApi>,
        store: Arc<dyn PortalStore>,
        demo_challenge_id: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            broker,
            store,
            demo_challenge_id: demo_challenge_id.into(),
        }
    }

    /// All trading accounts owned by `email`, both platforms normalized
    /// into the tagged union. One platform failing does not hide the
    /// other's accounts; both failing surfaces the MT5 error.
    pub async fn list_accounts_for_user(
        &self,
        email: &str,
    ) -> Result<Vec<TradingAccount>, RegistryError> {
        let (mt5, mtt) = tokio::join!(
            self.accounts.find_by_email(email),
            self.store.mtt_trading_accounts_by_email(email)
        );

        if let (Err(mt5_err), Err(mtt_err)) = (mt5.as_ref(), mtt.as_ref()) {
            warn!(%email, %mt5_err, %mtt_err, "Both platforms failed listing accounts");
        }

        let mut accounts = Vec::new();
        match mt5 {
            Ok(found) => accounts.extend(found.into_iter().map(TradingAccount::from)),
            Err(error) => {
                if mtt.is_err() {
                    return Err(error.into());
                }
                warn!(%email, %error, "MT5 listing failed; returning MTT accounts only");
            }
        }
        match mtt {
            Ok(found) => accounts.extend(found.into_iter().map(TradingAccount::from)),
            Err(error) => warn!(%email, %error, "MTT listing failed; returning MT5 accounts only"),
        }
        Ok(accounts)
    }

    /// Provision a demo account on the requested platform
    pub async fn create_demo_account(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        platform: PlatformKind,
    ) -> Result<TradingAccount, RegistryError> {
        match platform {
            PlatformKind::Mt5 => self.provision_mt5(email).await,
            PlatformKind::Mtt => self.provision_mtt(email, first_name, last_name).await,
        }
    }

    /// MT5 path: pull a pool entry, find-or-create the user's account
    /// carrying the pool credentials, then bind the pool entry to it.
    async fn provision_mt5(&self, email: &str) -> Result<TradingAccount, RegistryError> {
        let entry = self
            .store
            .available_demo()
            .await?
            .ok_or(RegistryError::NoAccountsAvailable)?;
        let Some(demo_id) = entry.id.clone() else {
            return Err(RegistryError::NoAccountsAvailable);
        };

        let existing = self.accounts.find_by_email(email).await?;
        let account = match existing.into_iter().next() {
            None => {
                self.accounts
                    .create(&NewMt5Account {
                        server: entry.server.clone(),
                        login: entry.login.clone(),
                        password: entry.password.clone(),
                        email: email.to_string(),
                        status: AccountStatus::Active,
                    })
                    .await?
            }
            Some(current) => {
                self.accounts
                    .update(
                        &current.id,
                        &Mt5AccountUpdate {
                            server: entry.server.clone(),
                            login: entry.login.clone(),
                            password: entry.password.clone(),
                            email: email.to_string(),
                            status: AccountStatus::Active,
                        },
                    )
                    .await?
            }
        };

        self.store.assign_demo(&demo_id, &account.id).await?;
        info!(%email, account_id = %account.id, demo_id = %demo_id, "Provisioned MT5 demo account");

        let mut normalized = TradingAccount::from(account);
        normalized.demo_account_id = Some(demo_id);
        Ok(normalized)
    }

    /// MTT path: find-or-create the broker account (mirroring new ones
    /// with their generated password), then create the demo trading
    /// account on the configured challenge and mirror it too.
    async fn provision_mtt(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<TradingAccount, RegistryError> {
        let broker_account = match self.broker.account_by_email(email).await {
            Ok(account) => account,
            Err(error) if error.is_not_found() => {
                self.register_broker_account(email, first_name, last_name)
                    .await?
            }
            Err(error) => return Err(error.into()),
        };

        let name = format!("{first_name} {last_name}'s Demo Trading Account");
        let trading_account = self
            .broker
            .create_trading_account(
                &NewTradingAccount {
                    challenge_id: self.demo_challenge_id.clone(),
                    account_uuid: broker_account.uuid.clone(),
                    name: name.clone(),
                },
                &TradingAccountOptions::default(),
            )
            .await?;

        self.store
            .save_mtt_trading_account(&StoredMttTradingAccount::from_provisioned(
                &trading_account,
                &name,
            ))
            .await?;
        info!(%email, trading_account_id = %trading_account.id, "Provisioned MTT demo trading account");

        Ok(trading_account.into())
    }

    async fn register_broker_account(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<MttAccount, RegistryError> {
        let password = generate_account_password();
        let created = self
            .broker
            .create_account(&CreateMttAccount {
                email: email.to_string(),
                password: password.clone(),
                client_type: Default::default(),
                create_as_deposited_account: false,
                personal_details: MttPersonalDetails {
                    firstname: first_name.to_string(),
                    lastname: last_name.to_string(),
                },
            })
            .await?;

        self.store
            .save_mtt_account(&StoredMttAccount::from_account(&created, &password))
            .await?;
        info!(%email, uuid = %created.uuid, "Registered MatchTrader account");
        Ok(created)
    }

    /// Toggle an account's status. Deactivation always writes blanked
    /// credentials; the audit record lands before the write.
    pub async fn set_status(
        &self,
        account_id: &str,
        status: AccountStatus,
    ) -> Result<TradingAccount, RegistryError> {
        let account = self.accounts.get(account_id).await?;

        self.store
            .record_audit(&AuditRecord::new(
                AuditAction::StatusChange,
                &account.email,
                account_id,
                json!({
                    "previousStatus": account.status.to_string(),
                    "newStatus": status.to_string(),
                    "server": account.server,
                    "login": account.login,
                }),
            ))
            .await?;

        let mut update = Mt5AccountUpdate::from_account(&account);
        update.status = status;
        if status == AccountStatus::Inactive {
            update.login.clear();
            update.password.clear();
        }

        let updated = self.accounts.update(account_id, &update).await?;
        info!(account_id = %account_id, status = %status, "Account status changed");
        Ok(updated.into())
    }

    /// Move an account to a new owner email. Rejected when the email is
    /// already held by a different account.
    pub async fn reassign_email(
        &self,
        account_id: &str,
        new_email: &str,
    ) -> Result<TradingAccount, RegistryError> {
        let account = self.accounts.get(account_id).await?;

        let holders = self.accounts.find_by_email(new_email).await?;
        if holders.iter().any(|held| held.id != account_id) {
            return Err(RegistryError::EmailInUse);
        }

        self.store
            .record_audit(&AuditRecord::new(
                AuditAction::EmailChange,
                &account.email,
                account_id,
                json!({
                    "previousEmail": account.email,
                    "newEmail": new_email,
                    "server": account.server,
                    "login": account.login,
                }),
            ))
            .await?;

        let mut update = Mt5AccountUpdate::from_account(&account);
        update.email = new_email.to_string();

        let updated = self.accounts.update(account_id, &update).await?;
        info!(account_id = %account_id, "Account email reassigned");
        Ok(updated.into())
    }

    /// Blank an account's credentials and deactivate it, with an
    /// `ACCOUNT_REMOVED` audit record first.
    pub async fn clear_account(&self, account_id: &str) -> Result<TradingAccount, RegistryError> {
        let account = self.accounts.get(account_id).await?;

        self.store
            .record_audit(&AuditRecord::new(
                AuditAction::AccountRemoved,
                &account.email,
                account_id,
                json!({
                    "server": account.server,
                    "login": account.login,
                    "previousStatus": account.status.to_string(),
                }),
            ))
            .await?;

        let mut update = Mt5AccountUpdate::from_account(&account);
        update.login.clear();
        update.password.clear();
        update.status = AccountStatus::Inactive;

        let updated = self.accounts.update(account_id, &update).await?;
        info!(account_id = %account_id, "Account cleared");
        Ok(updated.into())
    }

    /// Point a pool entry at a new holder
    pub async fn update_assignment(
        &self,
        demo_id: &str,
        assigned_to: &str,
    ) -> Result<DemoAccount, RegistryError> {
        let patched = self
            .store
            .patch_demo(demo_id, &DemoAccountPatch::assign_to(assigned_to))
            .await?;
        Ok(patched)
    }

    /// Park the pool entry on the reserved holder and clear the owner's
    /// linked MT5 account, if one exists
    pub async fn remove_assignment(&self, demo_id: &str, email: &str) -> Result<(), RegistryError> {
        self.update_assignment(demo_id, VOID_USER).await?;

        let accounts = self.accounts.find_by_email(email).await?;
        if let Some(account) = accounts.into_iter().next() {
            self.clear_account(&account.id).await?;
        }
        Ok(())
    }

    /// Return a pool entry to circulation
    pub async fn clear_assignment(&self, demo_id: &str) -> Result<DemoAccount, RegistryError> {
        self.update_assignment(demo_id, "").await
    }

    /// Link team-member emails to an assigned pool entry
    pub async fn link_users(&self, demo_id: &str, emails: &[String]) -> Result<(), RegistryError> {
        self.store.link_users(demo_id, emails).await?;
        info!(demo_id = %demo_id, count = emails.len(), "Linked users to demo account");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        MockAccountStore, MockBrokerApi, MockPortalStore, Mt5Account, MttChallengeDetails,
        MttTradingAccount,
    };

    fn pool_entry(id: Option<&str>) -> DemoAccount {
        DemoAccount {
            id: id.map(str::to_string),
            login: "100200".to_string(),
            password: "pool-pass".to_string(),
            readonly: "pool-view".to_string(),
            server: "PropDesk-Demo".to_string(),
            email: String::new(),
            assigned_to: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    fn mt5_account(id: &str, email: &str, status: AccountStatus) -> Mt5Account {
        Mt5Account {
            id: id.to_string(),
            server: "PropDesk-Live".to_string(),
            login: "555001".to_string(),
            password: "secret".to_string(),
            email: email.to_string(),
            status,
            created_at: None,
            updated_at: None,
        }
    }

    fn registry(
        accounts: MockAccountStore,
        broker: MockBrokerApi,
        store: MockPortalStore,
    ) -> Registry {
        Registry::new(
            Arc::new(accounts),
            Arc::new(broker),
            Arc::new(store),
            "demo-challenge",
        )
    }

    #[tokio::test]
    async fn empty_pool_returns_typed_error_without_writes() {
        let mut store = MockPortalStore::new();
        store.expect_available_demo().returning(|| Ok(None));
        store.expect_assign_demo().times(0);

        let mut accounts = MockAccountStore::new();
        accounts.expect_create().times(0);
        accounts.expect_update().times(0);

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let result = registry
            .create_demo_account("trader@hku.hk", "Ada", "Wong", PlatformKind::Mt5)
            .await;

        assert!(matches!(result, Err(RegistryError::NoAccountsAvailable)));
    }

    #[tokio::test]
    async fn pool_entry_without_id_counts_as_exhausted() {
        let mut store = MockPortalStore::new();
        store
            .expect_available_demo()
            .returning(|| Ok(Some(pool_entry(None))));
        store.expect_assign_demo().times(0);

        let mut accounts = MockAccountStore::new();
        accounts.expect_find_by_email().times(0);

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let result = registry
            .create_demo_account("trader@hku.hk", "Ada", "Wong", PlatformKind::Mt5)
            .await;
        assert!(matches!(result, Err(RegistryError::NoAccountsAvailable)));
    }

    #[tokio::test]
    async fn mt5_provisioning_creates_account_with_pool_credentials() {
        let mut store = MockPortalStore::new();
        store
            .expect_available_demo()
            .returning(|| Ok(Some(pool_entry(Some("demo-1")))));
        store
            .expect_assign_demo()
            .withf(|demo_id, account_id| demo_id == "demo-1" && account_id == "mt5-9")
            .times(1)
            .returning(|_, _| Ok(pool_entry(Some("demo-1"))));

        let mut accounts = MockAccountStore::new();
        accounts.expect_find_by_email().returning(|_| Ok(Vec::new()));
        accounts
            .expect_create()
            .withf(|new| {
                new.login == "100200"
                    && new.password == "pool-pass"
                    && new.server == "PropDesk-Demo"
                    && new.status == AccountStatus::Active
            })
            .times(1)
            .returning(|new| {
                let mut created = mt5_account("mt5-9", &new.email, new.status);
                created.server = new.server.clone();
                created.login = new.login.clone();
                created.password = new.password.clone();
                Ok(created)
            });

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let account = registry
            .create_demo_account("trader@hku.hk", "Ada", "Wong", PlatformKind::Mt5)
            .await
            .unwrap();

        assert_eq!(account.kind, PlatformKind::Mt5);
        assert_eq!(account.login, "100200");
        assert_eq!(account.demo_account_id.as_deref(), Some("demo-1"));
        assert_eq!(account.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn mt5_provisioning_reuses_existing_account() {
        let mut store = MockPortalStore::new();
        store
            .expect_available_demo()
            .returning(|| Ok(Some(pool_entry(Some("demo-2")))));
        store
            .expect_assign_demo()
            .withf(|demo_id, account_id| demo_id == "demo-2" && account_id == "mt5-3")
            .times(1)
            .returning(|_, _| Ok(pool_entry(Some("demo-2"))));

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_find_by_email()
            .returning(|email| Ok(vec![mt5_account("mt5-3", email, AccountStatus::Inactive)]));
        accounts.expect_create().times(0);
        accounts
            .expect_update()
            .withf(|id, update| {
                id == "mt5-3"
                    && update.login == "100200"
                    && update.password == "pool-pass"
                    && update.status == AccountStatus::Active
            })
            .times(1)
            .returning(|id, update| {
                let mut updated = mt5_account(id, &update.email, update.status);
                updated.login = update.login.clone();
                updated.password = update.password.clone();
                Ok(updated)
            });

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let account = registry
            .create_demo_account("trader@hku.hk", "Ada", "Wong", PlatformKind::Mt5)
            .await
            .unwrap();
        assert_eq!(account.id, "mt5-3");
        assert_eq!(account.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn deactivation_blanks_credentials_and_audits_first() {
        let mut store = MockPortalStore::new();
        store
            .expect_record_audit()
            .withf(|record| {
                record.action == AuditAction::StatusChange
                    && record.details["previousStatus"] == "active"
                    && record.details["newStatus"] == "inactive"
            })
            .times(1)
            .returning(|_| Ok(()));

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_get()
            .returning(|id| Ok(mt5_account(id, "trader@hku.hk", AccountStatus::Active)));
        accounts
            .expect_update()
            .withf(|_, update| {
                update.status == AccountStatus::Inactive
                    && update.login.is_empty()
                    && update.password.is_empty()
            })
            .times(1)
            .returning(|id, update| {
                let mut updated = mt5_account(id, &update.email, update.status);
                updated.login = update.login.clone();
                updated.password = update.password.clone();
                Ok(updated)
            });

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let account = registry
            .set_status("mt5-3", AccountStatus::Inactive)
            .await
            .unwrap();
        assert!(account.credentials_blanked());
    }

    #[tokio::test]
    async fn activation_preserves_credentials() {
        let mut store = MockPortalStore::new();
        store.expect_record_audit().returning(|_| Ok(()));

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_get()
            .returning(|id| Ok(mt5_account(id, "trader@hku.hk", AccountStatus::Inactive)));
        accounts
            .expect_update()
            .withf(|_, update| {
                update.status == AccountStatus::Active
                    && update.login == "555001"
                    && update.password == "secret"
            })
            .times(1)
            .returning(|id, update| {
                let mut updated = mt5_account(id, &update.email, update.status);
                updated.login = update.login.clone();
                updated.password = update.password.clone();
                Ok(updated)
            });

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let account = registry
            .set_status("mt5-3", AccountStatus::Active)
            .await
            .unwrap();
        assert!(!account.credentials_blanked());
    }

    #[tokio::test]
    async fn reassignment_to_taken_email_is_rejected_before_any_write() {
        let mut store = MockPortalStore::new();
        store.expect_record_audit().times(0);

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_get()
            .returning(|id| Ok(mt5_account(id, "old@hku.hk", AccountStatus::Active)));
        accounts
            .expect_find_by_email()
            .returning(|email| Ok(vec![mt5_account("mt5-77", email, AccountStatus::Active)]));
        accounts.expect_update().times(0);

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let result = registry.reassign_email("mt5-3", "taken@hku.hk").await;
        assert!(matches!(result, Err(RegistryError::EmailInUse)));
    }

    #[tokio::test]
    async fn reassignment_to_own_email_is_permitted() {
        let mut store = MockPortalStore::new();
        store
            .expect_record_audit()
            .withf(|record| record.action == AuditAction::EmailChange)
            .times(1)
            .returning(|_| Ok(()));

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_get()
            .returning(|id| Ok(mt5_account(id, "same@hku.hk", AccountStatus::Active)));
        accounts
            .expect_find_by_email()
            .returning(|email| Ok(vec![mt5_account("mt5-3", email, AccountStatus::Active)]));
        accounts
            .expect_update()
            .withf(|_, update| update.email == "same@hku.hk")
            .times(1)
            .returning(|id, update| Ok(mt5_account(id, &update.email, update.status)));

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let account = registry.reassign_email("mt5-3", "same@hku.hk").await.unwrap();
        assert_eq!(account.email, "same@hku.hk");
    }

    #[tokio::test]
    async fn listing_tolerates_one_platform_failing() {
        let mut accounts = MockAccountStore::new();
        accounts.expect_find_by_email().returning(|_| {
            Err(ProviderError::Status {
                service: "mt5-accounts",
                status: 500,
                message: "internal".to_string(),
            })
        });

        let mut store = MockPortalStore::new();
        store
            .expect_mtt_trading_accounts_by_email()
            .returning(|email| {
                Ok(vec![MttTradingAccount {
                    id: "ta-1".to_string(),
                    broker_id: Some("MTR-1".to_string()),
                    login: Some("700112".to_string()),
                    email: email.to_string(),
                    created: "2025-02-01T09:00:00Z".to_string(),
                    name: None,
                    challenge_details: MttChallengeDetails {
                        challenge_uuid: Some("demo-challenge".to_string()),
                        phase_step: Some(1),
                        status: Some("ACTIVE_PARTICIPATING_IN_CHALLENGE".to_string()),
                        days_traded: Some(0),
                        end_of_day_balance_snapshot: None,
                        is_ready_for_evaluation: false,
                        challenge_targets: Default::default(),
                    },
                }])
            });

        let registry = registry(accounts, MockBrokerApi::new(), store);
        let listed = registry
            .list_accounts_for_user("trader@hku.hk")
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].kind, PlatformKind::Mtt);
    }

    #[tokio::test]
    async fn mtt_provisioning_registers_broker_account_when_absent() {
        let mut broker = MockBrokerApi::new();
        broker
            .expect_account_by_email()
            .returning(|_| Err(ProviderError::NotFound { service: "matchtrader" }));
        broker
            .expect_create_account()
            .withf(|request| {
                request.email == "trader@hku.hk"
                    && request.password.len() == 12
                    && request.personal_details.firstname == "Ada"
                    && request.personal_details.lastname == "Wong"
            })
            .times(1)
            .returning(|request| {
                Ok(MttAccount {
                    uuid: "acc-uuid-1".to_string(),
                    created: "2025-02-01T09:00:00Z".to_string(),
                    updated: "2025-02-01T09:00:00Z".to_string(),
                    email: request.email.clone(),
                    verification_status: crate::types::VerificationStatus::New,
                    client_type: request.client_type,
                    personal_details: request.personal_details.clone(),
                })
            });
        broker
            .expect_create_trading_account()
            .withf(|request, options| {
                request.challenge_id == "demo-challenge"
                    && request.account_uuid == "acc-uuid-1"
                    && request.name == "Ada Wong's Demo Trading Account"
                    && options.instantly_active
                    && options.phase_step == 1
            })
            .times(1)
            .returning(|request, _| {
                Ok(MttTradingAccount {
                    id: "ta-9".to_string(),
                    broker_id: Some("MTR-9".to_string()),
                    login: Some("700900".to_string()),
                    email: "trader@hku.hk".to_string(),
                    created: "2025-02-01T09:00:05Z".to_string(),
                    name: Some(request.name.clone()),
                    challenge_details: MttChallengeDetails {
                        challenge_uuid: Some(request.challenge_id.clone()),
                        phase_step: Some(1),
                        status: Some("ACTIVE_PARTICIPATING_IN_CHALLENGE".to_string()),
                        days_traded: Some(0),
                        end_of_day_balance_snapshot: None,
                        is_ready_for_evaluation: false,
                        challenge_targets: Default::default(),
                    },
                })
            });

        let mut store = MockPortalStore::new();
        store
            .expect_save_mtt_account()
            .withf(|mirror| mirror.password.len() == 12 && mirror.email == "trader@hku.hk")
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_save_mtt_trading_account()
            .withf(|mirror| {
                mirror.id == "ta-9"
                    && mirror.name == "Ada Wong's Demo Trading Account"
                    && mirror.challenge_details.phase_step.as_deref() == Some("1")
            })
            .times(1)
            .returning(|_| Ok(()));

        let registry = registry(MockAccountStore::new(), broker, store);
        let account = registry
            .create_demo_account("trader@hku.hk", "Ada", "Wong", PlatformKind::Mtt)
            .await
            .unwrap();

        assert_eq!(account.kind, PlatformKind::Mtt);
        assert_eq!(account.login, "700900");
        assert_eq!(account.status, AccountStatus::Active);
    }

    #[tokio::test]
    async fn removing_an_assignment_parks_the_entry_on_void_user() {
        let mut store = MockPortalStore::new();
        store
            .expect_patch_demo()
            .withf(|demo_id, patch| demo_id == "demo-4" && patch.assigned_to == VOID_USER)
            .times(1)
            .returning(|_, _| Ok(pool_entry(Some("demo-4"))));
        store
            .expect_record_audit()
            .withf(|record| record.action == AuditAction::AccountRemoved)
            .times(1)
            .returning(|_| Ok(()));

        let mut accounts = MockAccountStore::new();
        accounts
            .expect_find_by_email()
            .returning(|email| Ok(vec![mt5_account("mt5-3", email, AccountStatus::Active)]));
        accounts
            .expect_get()
            .returning(|id| Ok(mt5_account(id, "trader@hku.hk", AccountStatus::Active)));
        accounts
            .expect_update()
            .withf(|_, update| {
                update.login.is_empty()
                    && update.password.is_empty()
                    && update.status == AccountStatus::Inactive
            })
            .times(1)
            .returning(|id, update| {
                let mut updated = mt5_account(id, &update.email, update.status);
                updated.login = update.login.clone();
                updated.password = update.password.clone();
                Ok(updated)
            });

        let registry = registry(accounts, MockBrokerApi::new(), store);
        registry
            .remove_assignment("demo-4", "trader@hku.hk")
            .await
            .unwrap();
    }
}
