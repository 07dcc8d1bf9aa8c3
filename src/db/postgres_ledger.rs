// PostgreSQL ledger store
// All balance mutations are SQL atomic increments, and every attribution or
// distribution is one transaction: either all of its rows commit or none do.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::{
        ledger::{AttributionWrite, DistributionWrite, LedgerError, LedgerStore},
        DieselPool,
    },
    models::{
        Account, NewAccount, NewCommissionPayout, NewProcessedEvent, NewReferralEvent,
        ReferralEventKind, SubscriptionPlan, SubscriptionStatus,
    },
    schema::{accounts, commission_payouts, processed_events, referral_events},
};

#[derive(Clone)]
pub struct PostgresLedger {
    pool: DieselPool,
}

impl PostgresLedger {
    pub fn new(pool: DieselPool) -> Self {
        Self { pool }
    }

    async fn conn(
        &self,
    ) -> Result<
        bb8::PooledConnection<
            '_,
            diesel_async::pooled_connection::AsyncDieselConnectionManager<
                diesel_async::AsyncPgConnection,
            >,
        >,
        LedgerError,
    > {
        self.pool
            .get()
            .await
            .map_err(|e| LedgerError::Pool(format!("Database connection failed: {}", e)))
    }
}

#[async_trait]
impl LedgerStore for PostgresLedger {
    async fn get_account_by_id(&self, account_id: Uuid) -> Result<Option<Account>, LedgerError> {
        let mut conn = self.conn().await?;
        Ok(Account::find_by_id(&mut conn, account_id).await?)
    }

    async fn get_account_by_code(&self, code: &str) -> Result<Option<Account>, LedgerError> {
        let mut conn = self.conn().await?;
        Ok(Account::find_by_referral_code(&mut conn, code).await?)
    }

    async fn referral_code_exists(&self, code: &str) -> Result<bool, LedgerError> {
        let mut conn = self.conn().await?;

        let count: i64 = accounts::table
            .filter(accounts::referral_code.eq(code))
            .count()
            .get_result(&mut conn)
            .await?;

        Ok(count > 0)
    }

    async fn create_account(&self, new_account: NewAccount) -> Result<Account, LedgerError> {
        let mut conn = self.conn().await?;

        diesel::insert_into(accounts::table)
            .values(&new_account)
            .get_result::<Account>(&mut conn)
            .await
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    info,
                ) => match info.constraint_name() {
                    Some(name) if name.contains("referral_code") => {
                        LedgerError::DuplicateCode(new_account.referral_code.clone())
                    },
                    _ => LedgerError::DuplicateEmail(new_account.email.clone()),
                },
                other => other.into(),
            })
    }

    async fn apply_attribution(&self, write: AttributionWrite) -> Result<(), LedgerError> {
        let mut conn = self.conn().await?;

        conn.transaction::<(), LedgerError, _>(|conn| {
            Box::pin(async move {
                let now = Utc::now();

                // Idempotency gate: the grant happens exactly once per account
                let updated = diesel::update(
                    accounts::table
                        .filter(accounts::id.eq(write.account_id))
                        .filter(accounts::attributed_at.is_null()),
                )
                .set((
                    accounts::attributed_at.eq(now),
                    accounts::credits.eq(accounts::credits + write.initial_credits),
                    accounts::referred_by.eq(write.referred_by.as_deref()),
                    accounts::updated_at.eq(now),
                ))
                .execute(conn)
                .await?;

                if updated == 0 {
                    // Either the account vanished or attribution already ran;
                    // distinguish so retried webhooks get a clean no-op
                    let exists: i64 = accounts::table
                        .filter(accounts::id.eq(write.account_id))
                        .count()
                        .get_result(conn)
                        .await?;
                    return Err(if exists > 0 {
                        LedgerError::AlreadyProcessed
                    } else {
                        LedgerError::AccountNotFound
                    });
                }

                if let Some(grant) = &write.referrer {
                    let credited = diesel::update(
                        accounts::table.filter(accounts::id.eq(grant.referrer_id)),
                    )
                    .set((
                        accounts::credits.eq(accounts::credits + grant.credits),
                        accounts::referral_impact.eq(accounts::referral_impact + grant.impact),
                        accounts::referral_count.eq(accounts::referral_count + 1),
                        accounts::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                    if credited != 1 {
                        return Err(LedgerError::Database(format!(
                            "Referrer {} disappeared during attribution",
                            grant.referrer_id
                        )));
                    }
                }

                let details = json!({
                    "initial_credits": write.initial_credits,
                    "referred_by": write.referred_by,
                    "referrer_id": write.referrer.as_ref().map(|g| g.referrer_id),
                });
                diesel::insert_into(referral_events::table)
                    .values(&NewReferralEvent::new(
                        ReferralEventKind::Attribution,
                        write.account_id,
                        details,
                    ))
                    .execute(conn)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    async fn apply_distribution(&self, write: DistributionWrite) -> Result<(), LedgerError> {
        let mut conn = self.conn().await?;

        conn.transaction::<(), LedgerError, _>(|conn| {
            Box::pin(async move {
                let now = Utc::now();

                // Idempotency gate for retried webhook deliveries
                if let Some(event_id) = &write.event_id {
                    let inserted = diesel::insert_into(processed_events::table)
                        .values(&NewProcessedEvent {
                            event_id: event_id.clone(),
                            kind: ReferralEventKind::Distribution.as_str().to_string(),
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;

                    if inserted == 0 {
                        return Err(LedgerError::AlreadyProcessed);
                    }
                }

                for credit in &write.credits {
                    let credited = diesel::update(
                        accounts::table.filter(accounts::id.eq(credit.beneficiary_id)),
                    )
                    .set((
                        accounts::total_referral_earnings_cents
                            .eq(accounts::total_referral_earnings_cents + credit.amount_cents),
                        accounts::pending_payout_cents
                            .eq(accounts::pending_payout_cents + credit.amount_cents),
                        accounts::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                    // A vanished beneficiary aborts the whole distribution;
                    // the delivery retries it from level 1
                    if credited != 1 {
                        return Err(LedgerError::Database(format!(
                            "Beneficiary {} disappeared during distribution",
                            credit.beneficiary_id
                        )));
                    }

                    diesel::insert_into(commission_payouts::table)
                        .values(&NewCommissionPayout {
                            event_id: write.event_id.clone(),
                            paying_account_id: write.paying_account_id,
                            beneficiary_account_id: credit.beneficiary_id,
                            level: i32::from(credit.level),
                            amount_cents: credit.amount_cents,
                            plan: write.plan.as_str().to_string(),
                        })
                        .execute(conn)
                        .await?;
                }

                let total_cents: i64 = write.credits.iter().map(|c| c.amount_cents).sum();
                let details = json!({
                    "event_id": write.event_id,
                    "plan": write.plan.as_str(),
                    "is_new_subscription": write.is_new_subscription,
                    "levels": write.credits.len(),
                    "total_cents": total_cents,
                    "credits": write.credits,
                });
                diesel::insert_into(referral_events::table)
                    .values(&NewReferralEvent::new(
                        ReferralEventKind::Distribution,
                        write.paying_account_id,
                        details,
                    ))
                    .execute(conn)
                    .await?;

                Ok(())
            })
        })
        .await
    }

    async fn set_subscription(
        &self,
        account_id: Uuid,
        plan: SubscriptionPlan,
        status: SubscriptionStatus,
    ) -> Result<(), LedgerError> {
        let mut conn = self.conn().await?;

        let updated = diesel::update(accounts::table.filter(accounts::id.eq(account_id)))
            .set((
                accounts::subscription_plan.eq(plan.as_str()),
                accounts::subscription_status.eq(status.as_str()),
                accounts::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(LedgerError::AccountNotFound);
        }

        Ok(())
    }

    async fn record_event(&self, event: NewReferralEvent) -> Result<(), LedgerError> {
        let mut conn = self.conn().await?;

        diesel::insert_into(referral_events::table)
            .values(&event)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), LedgerError> {
        let conn = self.conn().await?;
        drop(conn);
        Ok(())
    }
}
