//! PostgreSQL store tests
//!
//! These tests require a database connection.
//! Run with: DATABASE_URL=... cargo test --test integration_pg_store -- --ignored --test-threads=1

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use sqlx::Executor;

use cashpal::domain::{AccountUpdate, NewAccount, NewMember, NewTransaction, NewUser};
use cashpal::store::{CredentialStore, PgStore, StoreError};

mod common;

async fn store_with_user(username: &str) -> (PgStore, i32) {
    let pool = common::setup_test_db().await;
    let store = PgStore::new(pool);
    let user = store
        .create_user(NewUser {
            username: username.to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    (store, user.id)
}

fn new_account(user_id: i32) -> NewAccount {
    NewAccount {
        user_id,
        account_name: "Shared".to_string(),
        account_type: "joint".to_string(),
    }
}

#[tokio::test]
#[ignore]
async fn test_account_creation_adds_admin_in_one_transaction() {
    let (store, user_id) = store_with_user("alice").await;

    let (account, admin) = store
        .create_account_with_admin(new_account(user_id))
        .await
        .unwrap();
    assert_eq!(admin.account_id, account.id);
    assert_eq!(admin.member_role_id, 1);

    let membership = store
        .get_account_with_member_check(account.id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert!(membership.is_member());
}

#[tokio::test]
#[ignore]
async fn test_account_creation_for_unknown_user_leaves_nothing() {
    let (store, _) = store_with_user("alice").await;

    let err = store
        .create_account_with_admin(new_account(424242))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore]
async fn test_failed_admin_insert_rolls_back_account() {
    let (store, user_id) = store_with_user("alice").await;

    store
        .pool()
        .execute(
            r#"
            CREATE OR REPLACE FUNCTION reject_member_insert() RETURNS trigger AS $$
            BEGIN
                RAISE EXCEPTION 'member inserts disabled';
            END;
            $$ LANGUAGE plpgsql;
            DROP TRIGGER IF EXISTS reject_member_insert ON members;
            CREATE TRIGGER reject_member_insert BEFORE INSERT ON members
                FOR EACH ROW EXECUTE FUNCTION reject_member_insert();
            "#,
        )
        .await
        .unwrap();

    let result = store.create_account_with_admin(new_account(user_id)).await;

    store
        .pool()
        .execute("DROP TRIGGER reject_member_insert ON members")
        .await
        .unwrap();

    assert!(matches!(result, Err(StoreError::Database(_))));
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
#[ignore]
async fn test_unique_constraints_map_to_conflict() {
    let (store, user_id) = store_with_user("alice").await;

    let err = store
        .create_user(NewUser {
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let (account, _) = store
        .create_account_with_admin(new_account(user_id))
        .await
        .unwrap();
    let err = store
        .create_member(NewMember {
            account_id: account.id,
            user_id,
            member_role_id: 2,
        })
        .await
        .unwrap_err();
    assert!(err.is_conflict());
}

#[tokio::test]
#[ignore]
async fn test_membership_scoped_queries() {
    let (store, alice) = store_with_user("alice").await;
    let bob = store
        .create_user(NewUser {
            username: "bob".to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
        .id;

    let (account, _) = store
        .create_account_with_admin(new_account(alice))
        .await
        .unwrap();
    let transaction = store
        .create_transaction(NewTransaction {
            account_id: account.id,
            user_id: alice,
            transaction_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            transaction_type_id: 2,
            amount: dec!(-42.50),
            description: "groceries".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(transaction.amount, dec!(-42.50));

    assert!(store
        .get_account_with_member_check(account.id, bob)
        .await
        .unwrap()
        .is_none());
    assert!(store
        .list_members_with_member_check(account.id, bob)
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .get_transaction_with_member_check(account.id, transaction.id, bob)
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        store
            .list_transactions_with_member_check(account.id, alice)
            .await
            .unwrap()
            .len(),
        1
    );

    let updated = store
        .update_account(AccountUpdate {
            id: account.id,
            account_name: "Holidays".to_string(),
            account_type: "joint".to_string(),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.account_name, "Holidays");

    assert!(store.delete_member(account.id, alice).await.unwrap());
    assert!(!store.delete_member(account.id, alice).await.unwrap());
}
