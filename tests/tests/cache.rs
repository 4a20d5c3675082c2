use tests::{models::*, *};

use pretty_assertions::assert_eq;
use strata::{HasMany, RelationScope};

async fn seed(t: &Test) {
    let mut tag = Tag {
        l11n: HasMany::new([TagL11n::new("German", "de"), TagL11n::new("English", "en")]),
        ..Tag::default()
    };
    t.db.create(&mut tag, RelationScope::ALL).await.unwrap();
    t.log.clear();
}

#[tokio::test]
async fn session_reuses_entities_read_as_deep() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    let mut session = t.db.session();

    let first = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    let selects = t.log.selects();
    assert_eq!(selects, 2);

    let second = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    let third = assert_some!(session.read::<Tag>().depth(2).get(1).await.unwrap());

    assert_eq!(t.log.selects(), selects);
    assert_eq!(second.l11n.get().len(), first.l11n.get().len());
    assert_eq!(third.l11n.get()[1].title, "English");
}

#[tokio::test]
async fn deeper_read_goes_back_to_the_store() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    let mut session = t.db.session();

    let shallow = assert_some!(session.read::<Tag>().depth(1).get(1).await.unwrap());
    assert!(!shallow.l11n.is_loaded());
    assert_eq!(t.log.selects(), 1);

    let deep = assert_some!(session.read::<Tag>().depth(2).get(1).await.unwrap());
    assert_eq!(deep.l11n.get().len(), 2);
    assert_eq!(t.log.selects(), 3);
}

#[tokio::test]
async fn narrower_cached_scope_is_not_reused() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    let mut session = t.db.session();

    let tag = assert_some!(session
        .read::<Tag>()
        .scope(RelationScope::NONE)
        .get(1)
        .await
        .unwrap());
    assert!(!tag.l11n.is_loaded());

    let tag = assert_some!(session.read::<Tag>().get(1).await.unwrap());
    assert_eq!(tag.l11n.get().len(), 2);
}

#[tokio::test]
async fn separate_calls_do_not_share_a_cache() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    t.db.get::<Tag>(1).await.unwrap();
    let selects = t.log.selects();

    t.db.get::<Tag>(1).await.unwrap();
    assert_eq!(t.log.selects(), selects * 2);
}

#[tokio::test]
async fn writes_evict_the_entity() {
    let t = setup(models!(Account)).await;

    let mut account = Account::new("ada");
    t.db.create(&mut account, RelationScope::ALL).await.unwrap();

    let mut session = t.db.session();
    let mut loaded = assert_some!(session.get::<Account>(1).await.unwrap());

    loaded.name = "grace".to_string();
    session
        .update(&mut loaded, RelationScope::ALL, 3)
        .await
        .unwrap();

    let reread = assert_some!(session.get::<Account>(1).await.unwrap());
    assert_eq!(reread.name, "grace");
}

fn titles(tag: &Tag) -> Vec<&str> {
    tag.l11n.get().iter().map(|l11n| l11n.title.as_str()).collect()
}

#[tokio::test]
async fn deleted_member_leaves_its_cached_owner() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    let mut session = t.db.session();
    let tag = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    assert_eq!(titles(&tag), ["German", "English"]);

    session
        .delete(&tag.l11n.get()[0], RelationScope::ALL)
        .await
        .unwrap();

    let tag = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    assert_eq!(titles(&tag), ["English"]);
}

#[tokio::test]
async fn updated_member_is_reread_through_its_owner() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    let mut session = t.db.session();
    let tag = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    assert_eq!(titles(&tag), ["German", "English"]);

    let mut member = TagL11n {
        id: 1,
        tag: 1,
        title: "Deutsch".to_string(),
        lang: "de".to_string(),
    };
    session
        .update(&mut member, RelationScope::ALL, 3)
        .await
        .unwrap();

    let tag = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    assert_eq!(titles(&tag), ["Deutsch", "English"]);
}

#[tokio::test]
async fn created_member_shows_up_in_its_cached_owner() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    let mut session = t.db.session();
    let tag = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    assert_eq!(tag.l11n.get().len(), 2);

    let mut member = TagL11n {
        tag: 1,
        ..TagL11n::new("Français", "fr")
    };
    session.create(&mut member, RelationScope::ALL).await.unwrap();

    let tag = assert_some!(session.read::<Tag>().depth(3).get(1).await.unwrap());
    assert_eq!(titles(&tag), ["German", "English", "Français"]);
}

#[tokio::test]
async fn failed_call_leaves_no_partial_entries() {
    let t = setup(models!(Tag, TagL11n)).await;
    seed(&t).await;

    t.db.execute_batch("DROP TABLE tag_l11n").await.unwrap();

    let mut session = t.db.session();
    assert_err!(session.read::<Tag>().get(1).await);

    // The tag row itself reads fine once relations are out of scope
    let tag = assert_some!(session
        .read::<Tag>()
        .scope(RelationScope::NONE)
        .get(1)
        .await
        .unwrap());
    assert_eq!(tag.id, 1);
}
