use tests::{models::*, *};

use pretty_assertions::assert_eq;
use strata::{
    stmt::{Query, QueryKind, Value},
    RelationScope,
};

#[tokio::test]
async fn create_writes_owner_and_members() {
    let t = setup(models!(Tag, TagL11n)).await;

    let mut tag = Tag {
        l11n: strata::HasMany::new([TagL11n::new("German", "de")]),
        ..Tag::default()
    };

    let key = assert_ok!(t.db.create(&mut tag, RelationScope::ALL).await);
    assert_eq!(key, Value::I64(1));
    assert_eq!(tag.id, 1);
    assert_eq!(tag.l11n.get()[0].tag, 1);

    let rows = t
        .db
        .execute(Query::select(["tag_id"]).from("tag"))
        .await
        .unwrap()
        .into_rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_index(0), Some(&Value::I64(1)));

    let rows = t
        .db
        .execute(
            Query::select(["tag_l11n_id", "tag_l11n_tag", "tag_l11n_title", "tag_l11n_lang"])
                .from("tag_l11n"),
        )
        .await
        .unwrap()
        .into_rows();

    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].clone().into_values(),
        vec![
            Value::I64(1),
            Value::I64(1),
            Value::from("German"),
            Value::from("de"),
        ]
    );
}

#[tokio::test]
async fn create_is_idempotent_for_generated_keys() {
    let t = setup(models!(Tag, TagL11n)).await;

    let mut tag = Tag::default();
    let first = t.db.create(&mut tag, RelationScope::ALL).await.unwrap();

    t.log.clear();

    let second = t.db.create(&mut tag, RelationScope::ALL).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(t.log.inserts(), 0);
    assert_empty!(t.log.queries());
}

#[tokio::test]
async fn key_only_entity_inserts_a_placeholder_row() {
    let t = setup(models!(Tag, TagL11n)).await;

    let mut a = Tag::default();
    let mut b = Tag::default();
    t.db.create(&mut a, RelationScope::ALL).await.unwrap();
    t.db.create(&mut b, RelationScope::ALL).await.unwrap();

    assert_eq!((a.id, b.id), (1, 2));
    assert_eq!(t.log.inserts(), 2);
}

#[tokio::test]
async fn caller_chosen_key_is_kept() {
    let t = setup(models!(Language)).await;

    let mut language = Language {
        code: "de".to_string(),
        name: "German".to_string(),
    };

    let key = t.db.create(&mut language, RelationScope::ALL).await.unwrap();
    assert_eq!(key, Value::from("de"));

    let loaded = assert_some!(t.db.get::<Language>("de").await.unwrap());
    assert_eq!(loaded, language);
}

#[tokio::test]
async fn owned_entity_is_created_first() {
    let t = setup(models!(User, Profile)).await;

    let mut user = User {
        name: "ada".to_string(),
        profile: strata::OwnsOne::new(Profile {
            bio: "analyst".to_string(),
            ..Profile::default()
        }),
        ..User::default()
    };

    t.db.create(&mut user, RelationScope::ALL).await.unwrap();

    let inserts = t.log.queries_on(QueryKind::Insert, "profile");
    assert_eq!(inserts.len(), 1);

    let profile = user.profile.get();
    assert_eq!(profile.id, 1);

    let rows = t
        .db
        .execute(Query::select(["user_profile"]).from("app_user"))
        .await
        .unwrap()
        .into_rows();
    assert_eq!(rows[0].get_index(0), Some(&Value::I64(profile.id)));
}

#[tokio::test]
async fn join_table_rows_are_inserted_in_one_batch() {
    let t = setup(models!(Group, Account)).await;

    let mut group = Group {
        name: "staff".to_string(),
        accounts: strata::HasMany::new([Account::new("a"), Account::new("b"), Account::new("c")]),
        ..Group::default()
    };

    t.db.create(&mut group, RelationScope::ALL).await.unwrap();

    let links = t.log.queries_on(QueryKind::Insert, "group_account");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].values.len(), 3);

    let ids: Vec<_> = group.accounts.iter().map(|account| account.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn failed_insert_reports_the_statement() {
    let t = setup(models!(Tag, TagL11n)).await;

    t.db.execute_batch("DROP TABLE tag_l11n").await.unwrap();

    let mut tag = Tag {
        l11n: strata::HasMany::new([TagL11n::new("German", "de")]),
        ..Tag::default()
    };

    let err = assert_err!(t.db.create(&mut tag, RelationScope::ALL).await);
    assert!(err.is_statement_failed(), "{err}");

    let sql = assert_some!(err.sql());
    assert!(sql.contains("tag_l11n"), "{sql}");
}
