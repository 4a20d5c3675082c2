use tests::{models::*, *};

use pretty_assertions::assert_eq;
use strata::{
    stmt::{Query, QueryKind, Value},
    HasMany, Model, OwnsOne, RelationScope,
};

async fn group_with(t: &Test, names: &[&str]) -> Group {
    let mut group = Group {
        name: "staff".to_string(),
        accounts: HasMany::new(names.iter().map(|name| Account::new(name))),
        ..Group::default()
    };
    t.db.create(&mut group, RelationScope::ALL).await.unwrap();
    group
}

async fn links(t: &Test) -> Vec<(i64, i64)> {
    t.db.execute(
        Query::select(["group_account_group", "group_account_account"])
            .from("group_account")
            .order_by("group_account_account", strata::stmt::Direction::Asc),
    )
    .await
    .unwrap()
    .into_rows()
    .into_iter()
    .map(|row| {
        let values = row.into_values();
        (values[0].expect_i64(), values[1].expect_i64())
    })
    .collect()
}

#[tokio::test]
async fn scalars_are_written_in_one_statement() {
    let t = setup(models!(Account)).await;

    let mut account = Account::new("ada");
    t.db.create(&mut account, RelationScope::ALL).await.unwrap();
    t.log.clear();

    account.name = "grace".to_string();
    account.score = 9.5;
    account.active = true;

    let key = t.db.update(&mut account, RelationScope::ALL, 3).await.unwrap();
    assert_eq!(key, Value::I64(1));

    assert_eq!(t.log.len(), 1);
    let query = &t.log.queries()[0];
    assert_eq!(query.kind, QueryKind::Update);
    assert_eq!(query.set.len(), 5);

    let loaded = assert_some!(t.db.get::<Account>(1).await.unwrap());
    assert_eq!(loaded, account);
}

#[tokio::test]
async fn update_without_a_key_creates() {
    let t = setup(models!(Account)).await;

    let mut account = Account::new("ada");
    let key = t.db.update(&mut account, RelationScope::ALL, 3).await.unwrap();

    assert_eq!(key, Value::I64(1));
    assert_eq!(account.id, 1);
    assert_eq!(t.log.inserts(), 1);
    assert_eq!(t.log.updates(), 0);
}

#[tokio::test]
async fn fields_missing_from_the_record_are_kept() {
    let t = setup(models!(Account)).await;

    let mut account = Account::new("ada");
    account.score = 3.0;
    t.db.create(&mut account, RelationScope::ALL).await.unwrap();

    let mut record = t
        .db
        .read_records(Account::NAME)
        .get(1)
        .await
        .unwrap()
        .unwrap();
    record.remove("score");
    record.set("name", "grace");

    t.db.update_record(&mut record, RelationScope::ALL, 3).await.unwrap();

    let loaded = assert_some!(t.db.get::<Account>(1).await.unwrap());
    assert_eq!(loaded.name, "grace");
    assert_eq!(loaded.score, 3.0);
}

#[tokio::test]
async fn join_table_changes_apply_the_difference() {
    let t = setup(models!(Group, Account)).await;
    let mut group = group_with(&t, &["a", "b", "c"]).await;
    assert_eq!(links(&t).await, vec![(1, 1), (1, 2), (1, 3)]);

    let members = group.accounts.get_mut().unwrap();
    members.remove(0);
    members.push(Account::new("d"));

    t.log.clear();
    t.db.update(&mut group, RelationScope::ALL, 3).await.unwrap();

    let deletes = t.log.queries_on(QueryKind::Delete, "group_account");
    assert_eq!(deletes.len(), 1);

    let inserts = t.log.queries_on(QueryKind::Insert, "group_account");
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].values.len(), 1);

    assert_eq!(links(&t).await, vec![(1, 2), (1, 3), (1, 4)]);
}

#[tokio::test]
async fn unchanged_links_issue_no_writes() {
    let t = setup(models!(Group, Account)).await;
    let mut group = group_with(&t, &["a", "b"]).await;
    t.log.clear();

    t.db.update(&mut group, RelationScope::ALL, 3).await.unwrap();

    assert_empty!(t.log.queries_on(QueryKind::Delete, "group_account"));
    assert_empty!(t.log.queries_on(QueryKind::Insert, "group_account"));
    assert_eq!(links(&t).await, vec![(1, 1), (1, 2)]);
}

#[tokio::test]
async fn members_are_left_alone_below_the_full_scope() {
    let t = setup(models!(Group, Account)).await;
    let mut group = group_with(&t, &["a", "b"]).await;

    group.accounts = HasMany::new([]);
    t.log.clear();

    t.db.update(&mut group, RelationScope::OWNS_ONE, 3).await.unwrap();

    assert_eq!(t.log.queries_on(QueryKind::Update, "account_group").len(), 1);
    assert_empty!(t.log.queries_on(QueryKind::Select, "group_account"));
    assert_eq!(links(&t).await, vec![(1, 1), (1, 2)]);
}

#[tokio::test]
async fn unloaded_members_are_not_unlinked() {
    let t = setup(models!(Group, Account)).await;
    group_with(&t, &["a", "b"]).await;

    let mut group = assert_some!(t
        .db
        .read::<Group>()
        .scope(RelationScope::NONE)
        .get(1)
        .await
        .unwrap());
    assert!(!group.accounts.is_loaded());

    group.name = "ops".to_string();
    t.db.update(&mut group, RelationScope::ALL, 3).await.unwrap();

    assert_eq!(links(&t).await, vec![(1, 1), (1, 2)]);
}

#[tokio::test]
async fn inline_members_are_written_with_their_owner_key() {
    let t = setup(models!(Tag, TagL11n)).await;

    let mut tag = Tag {
        l11n: HasMany::new([TagL11n::new("German", "de")]),
        ..Tag::default()
    };
    t.db.create(&mut tag, RelationScope::ALL).await.unwrap();

    let l11n = tag.l11n.get_mut().unwrap();
    l11n[0].title = "Deutsch".to_string();
    l11n.push(TagL11n::new("English", "en"));

    t.db.update(&mut tag, RelationScope::ALL, 3).await.unwrap();

    let tag = assert_some!(t.db.get::<Tag>(1).await.unwrap());
    let l11n: Vec<_> = tag
        .l11n
        .iter()
        .map(|l11n| (l11n.tag, l11n.title.as_str()))
        .collect();
    assert_eq!(l11n, vec![(1, "Deutsch"), (1, "English")]);
}

#[tokio::test]
async fn owned_entity_is_updated_with_the_owner() {
    let t = setup(models!(User, Profile)).await;

    let mut user = User {
        name: "ada".to_string(),
        profile: OwnsOne::new(Profile {
            bio: "analyst".to_string(),
            ..Profile::default()
        }),
        ..User::default()
    };
    t.db.create(&mut user, RelationScope::ALL).await.unwrap();

    user.profile.get_mut().unwrap().bio = "engineer".to_string();
    t.db.update(&mut user, RelationScope::ALL, 3).await.unwrap();

    let user = assert_some!(t.db.get::<User>(1).await.unwrap());
    assert_eq!(user.profile.get().bio, "engineer");
}

#[tokio::test]
async fn relation_outside_the_scope_is_only_referenced() {
    let t = setup(models!(User, Profile)).await;

    let mut user = User {
        name: "ada".to_string(),
        profile: OwnsOne::new(Profile {
            bio: "analyst".to_string(),
            ..Profile::default()
        }),
        ..User::default()
    };
    t.db.create(&mut user, RelationScope::ALL).await.unwrap();

    user.profile.get_mut().unwrap().bio = "engineer".to_string();
    t.log.clear();

    t.db.update(&mut user, RelationScope::NONE, 3).await.unwrap();

    assert_empty!(t.log.queries_on(QueryKind::Update, "profile"));

    let user = assert_some!(t.db.get::<User>(1).await.unwrap());
    assert_eq!(user.profile.get().bio, "analyst");
}

#[tokio::test]
async fn depth_zero_writes_nothing() {
    let t = setup(models!(Account)).await;

    let mut account = Account::new("ada");
    t.db.create(&mut account, RelationScope::ALL).await.unwrap();
    t.log.clear();

    account.name = "grace".to_string();
    let key = t.db.update(&mut account, RelationScope::ALL, 0).await.unwrap();

    assert_eq!(key, Value::I64(1));
    assert!(t.log.is_empty());
}
