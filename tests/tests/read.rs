use tests::{models::*, *};

use pretty_assertions::assert_eq;
use strata::{
    stmt::{Direction, Entity, Key, Op, Query, QueryKind, Value},
    HasMany, OwnsOne, RelationScope,
};

async fn tag_with(t: &Test, titles: &[(&str, &str)]) -> Tag {
    let mut tag = Tag {
        l11n: HasMany::new(titles.iter().map(|(title, lang)| TagL11n::new(title, lang))),
        ..Tag::default()
    };
    t.db.create(&mut tag, RelationScope::ALL).await.unwrap();
    tag
}

#[tokio::test]
async fn tag_round_trip() {
    let t = setup(models!(Tag, TagL11n)).await;
    tag_with(&t, &[("German", "de")]).await;

    let tag = assert_some!(t.db.read::<Tag>().depth(3).get(1).await.unwrap());

    assert_eq!(tag.id, 1);
    assert_eq!(tag.l11n.get().len(), 1);
    assert_eq!(tag.l11n.get()[0].title, "German");
    assert_eq!(tag.l11n.get()[0].lang, "de");
}

#[tokio::test]
async fn missing_key_is_absent() {
    let t = setup(models!(Tag, TagL11n)).await;

    assert_none!(t.db.get::<Tag>(7).await.unwrap());

    let entity = t.db.read::<Tag>().get_entity(7).await.unwrap();
    assert_eq!(entity, Entity::absent("Tag", 7));
}

#[tokio::test]
async fn depth_zero_returns_the_sentinel_without_a_query() {
    let t = setup(models!(Tag, TagL11n)).await;
    tag_with(&t, &[]).await;
    t.log.clear();

    let entity = t.db.read::<Tag>().depth(0).get_entity(1).await.unwrap();

    assert!(entity.is_absent());
    assert_eq!(t.log.selects(), 0);
}

#[tokio::test]
async fn depth_one_loads_no_relations() {
    let t = setup(models!(User, Profile, Tag, TagL11n)).await;
    tag_with(&t, &[("German", "de")]).await;

    let mut user = User {
        name: "ada".to_string(),
        profile: OwnsOne::new(Profile::default()),
        ..User::default()
    };
    t.db.create(&mut user, RelationScope::ALL).await.unwrap();

    t.log.clear();

    let tag = assert_some!(t.db.read::<Tag>().depth(1).get(1).await.unwrap());
    assert!(!tag.l11n.is_loaded());

    let user = assert_some!(t.db.read::<User>().depth(1).get(1).await.unwrap());
    assert!(!user.profile.is_loaded());
    assert_eq!(user.profile.referenced_key(), Some(&Key::I64(1)));

    // One SELECT each, no joins and no member queries
    assert_eq!(t.log.selects(), 2);
    assert!(t.log.queries().iter().all(|query| query.joins.is_empty()));
}

#[tokio::test]
async fn owns_one_is_joined_into_the_same_select() {
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
    t.log.clear();

    let user = assert_some!(t.db.read::<User>().depth(2).get(1).await.unwrap());
    assert_eq!(user.profile.get().bio, "analyst");
    assert_eq!(t.log.selects(), 1);
}

#[tokio::test]
async fn cyclic_relations_terminate() {
    let t = setup(models!(User, Profile)).await;

    let mut user = User {
        name: "ada".to_string(),
        profile: OwnsOne::new(Profile::default()),
        ..User::default()
    };
    t.db.create(&mut user, RelationScope::ALL).await.unwrap();

    // Point the profile back at its owner
    t.db.execute(
        Query::update("profile")
            .set("profile_user", user.id)
            .where_("profile_id", Op::Eq, user.profile.get().id),
    )
    .await
    .unwrap();

    let entity = t.db.read::<User>().depth(3).get_entity(user.id).await.unwrap();
    let record = entity.expect_record();

    let profile = record.value("profile").expect_entity().expect_record();
    assert_eq!(profile.value("id"), &Value::I64(1));

    // The back reference is the owner still being loaded
    let back = profile.value("user").expect_entity();
    assert_eq!(back, &Entity::absent("User", user.id));
}

#[tokio::test]
async fn entity_nested_and_at_the_root_of_one_fetch() {
    let t = setup(models!(User, Profile)).await;

    let mut first = User {
        name: "ada".to_string(),
        profile: OwnsOne::new(Profile::default()),
        ..User::default()
    };
    t.db.create(&mut first, RelationScope::ALL).await.unwrap();

    let mut second = User {
        name: "grace".to_string(),
        ..User::default()
    };
    t.db.create(&mut second, RelationScope::ALL).await.unwrap();

    // The first user's profile points at the second user
    t.db.execute(
        Query::update("profile")
            .set("profile_user", second.id)
            .where_("profile_id", Op::Eq, first.profile.get().id),
    )
    .await
    .unwrap();

    let users = t.db.read::<User>().depth(3).all().await.unwrap();
    let mut ids: Vec<i64> = users.iter().map(|user| user.id).collect();
    ids.sort();
    assert_eq!(ids, [1, 2]);

    let nested = users
        .iter()
        .find(|user| user.id == 1)
        .map(|user| user.profile.get().user.get());
    assert_eq!(assert_some!(nested).name, "grace");

    let users = t.db.read::<User>().depth(3).get_many([1, 2]).await.unwrap();
    assert_eq!(users.keys().cloned().collect::<Vec<_>>(), [Key::I64(1), Key::I64(2)]);
    assert_eq!(users[&Key::I64(2)].name, "grace");
    assert!(!users[&Key::I64(2)].profile.is_loaded());
}

#[tokio::test]
async fn scope_none_leaves_relations_unloaded() {
    let t = setup(models!(User, Profile)).await;

    let mut user = User {
        profile: OwnsOne::new(Profile::default()),
        ..User::default()
    };
    t.db.create(&mut user, RelationScope::ALL).await.unwrap();

    let user = assert_some!(t
        .db
        .read::<User>()
        .scope(RelationScope::NONE)
        .depth(3)
        .get(1)
        .await
        .unwrap());

    assert!(!user.profile.is_loaded());
}

#[tokio::test]
async fn relation_directives_shape_members() {
    let t = setup(models!(Tag, TagL11n)).await;
    tag_with(&t, &[("German", "de"), ("Deutsch", "de"), ("English", "en")]).await;

    let tag = assert_some!(t
        .db
        .read::<Tag>()
        .filter_in("l11n", "lang", Op::Eq, "de")
        .sort_in("l11n", "title", Direction::Asc)
        .get(1)
        .await
        .unwrap());

    let titles: Vec<_> = tag.l11n.iter().map(|l11n| l11n.title.as_str()).collect();
    assert_eq!(titles, vec!["Deutsch", "German"]);

    let tag = assert_some!(t
        .db
        .read::<Tag>()
        .limit_in("l11n", 1)
        .get(1)
        .await
        .unwrap());
    assert_eq!(tag.l11n.get().len(), 1);
    assert_eq!(tag.l11n.get()[0].title, "German");
}

#[tokio::test]
async fn directives_do_not_outlive_the_call() {
    let t = setup(models!(Tag, TagL11n)).await;
    tag_with(&t, &[("German", "de"), ("English", "en")]).await;

    let mut session = t.db.session();

    let tag = assert_some!(session
        .read::<Tag>()
        .filter_in("l11n", "lang", Op::Eq, "en")
        .get(1)
        .await
        .unwrap());
    assert_eq!(tag.l11n.get().len(), 1);

    let tag = assert_some!(session.read::<Tag>().scope(RelationScope::ALL).get(1).await.unwrap());
    assert_eq!(tag.l11n.get().len(), 2);
}

#[tokio::test]
async fn newest_scope_keeps_the_highest_member() {
    let t = setup(models!(Tag, TagL11n)).await;
    tag_with(&t, &[("one", "de"), ("two", "de"), ("three", "de")]).await;

    let tag = assert_some!(t
        .db
        .read::<Tag>()
        .scope(RelationScope::ALL | RelationScope::NEWEST)
        .get(1)
        .await
        .unwrap());

    assert_eq!(tag.l11n.get().len(), 1);
    assert_eq!(tag.l11n.get()[0].title, "three");
}

#[tokio::test]
async fn members_of_many_owners_load_in_one_query() {
    let t = setup(models!(Tag, TagL11n)).await;
    tag_with(&t, &[("a", "de")]).await;
    tag_with(&t, &[("b", "de"), ("c", "de")]).await;
    tag_with(&t, &[]).await;
    t.log.clear();

    let tags = t.db.read::<Tag>().all().await.unwrap();

    let counts: Vec<_> = tags.iter().map(|tag| tag.l11n.get().len()).collect();
    assert_eq!(counts, vec![1, 2, 0]);

    assert_eq!(t.log.queries_on(QueryKind::Select, "tag").len(), 1);
    assert_eq!(t.log.queries_on(QueryKind::Select, "tag_l11n").len(), 1);
}

#[tokio::test]
async fn join_table_members_are_loaded() {
    let t = setup(models!(Group, Account)).await;

    let mut group = Group {
        name: "staff".to_string(),
        accounts: HasMany::new([Account::new("a"), Account::new("b")]),
        ..Group::default()
    };
    t.db.create(&mut group, RelationScope::ALL).await.unwrap();

    let group = assert_some!(t.db.get::<Group>(group.id).await.unwrap());
    let names: Vec<_> = group.accounts.iter().map(|account| account.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[tokio::test]
async fn typed_columns_survive_storage() {
    let t = setup(models!(Account)).await;

    let created = chrono::DateTime::parse_from_rfc3339("2024-03-01T12:30:45Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    let mut account = Account {
        name: "ada".to_string(),
        score: 2.5,
        active: true,
        created: Some(created),
        settings: serde_json::json!({ "theme": "dark", "tabs": [1, 2] }),
        ..Account::default()
    };
    t.db.create(&mut account, RelationScope::ALL).await.unwrap();

    let loaded = assert_some!(t.db.get::<Account>(account.id).await.unwrap());
    assert_eq!(loaded, account);
}
