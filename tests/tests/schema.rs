use tests::{models::*, *};

use pretty_assertions::assert_eq;
use strata::{
    schema::{self, ColumnType},
    stmt::{Entity, Record, Value},
    Db, RelationScope,
};

#[tokio::test]
async fn unregistered_relation_target_is_rejected() {
    let mut builder = Db::builder();
    builder.register::<Tag>();

    let err = assert_err!(builder.connect("sqlite::memory:").await);
    assert!(err.is_invalid_schema());
    assert!(err.to_string().contains("TagL11n"), "{err}");
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let mut builder = Db::builder();
    builder.register::<Account>().register::<Account>();

    let err = assert_err!(builder.connect("sqlite::memory:").await);
    assert!(err.is_invalid_schema());
}

#[tokio::test]
async fn unsupported_urls_are_rejected() {
    for url in ["postgresql://localhost/app", "not a url"] {
        let err = assert_err!(Db::builder().connect(url).await);
        assert!(err.is_invalid_connection_url(), "url={url}; err={err}");
    }
}

#[tokio::test]
async fn connects_from_a_url() {
    let mut builder = models!(Account);
    let db = builder.connect("sqlite::memory:").await.unwrap();
    db.execute_batch(models::SCHEMA).await.unwrap();

    let mut account = Account::new("ada");
    db.create(&mut account, RelationScope::ALL).await.unwrap();
    assert_eq!(db.read::<Account>().count().await.unwrap(), 1);
}

#[tokio::test]
async fn table_names_carry_the_prefix() {
    let mut builder = Db::builder();
    builder
        .table_name_prefix("app_")
        .register_model(
            schema::Model::new("Note", "note")
                .key("note_id", "id", ColumnType::Int)
                .column("note_body", ColumnType::String, "body"),
        );

    let t = setup(builder).await;
    t.db.execute_batch("CREATE TABLE app_note (note_id INTEGER PRIMARY KEY, note_body TEXT)")
        .await
        .unwrap();

    assert_eq!(t.db.table_name_prefix(), Some("app_"));
    assert_eq!(t.db.schema().model("Note").unwrap().table, "app_note");

    let mut note = Record::new("Note").with("body", "hello");
    let key = t.db.create_record(&mut note, RelationScope::ALL).await.unwrap();
    assert_eq!(key, Value::I64(1));

    let note = assert_some!(t.db.read_records("Note").get(1).await.unwrap());
    assert_eq!(note.value("body"), &Value::from("hello"));
}

#[tokio::test]
async fn reading_an_unregistered_model_fails() {
    let t = setup(models!(Account)).await;

    let err = assert_err!(t.db.read_records("Missing").all().await);
    assert!(err.is_invalid_schema());
}

#[tokio::test]
async fn unknown_column_type_fails_on_read_only() {
    let mut builder = Db::builder();
    builder.register_model(
        schema::Model::new("Blob", "blob")
            .key("blob_id", "id", ColumnType::Int)
            .column("blob_data", "compressed".parse().unwrap(), "data"),
    );

    let t = setup(builder).await;
    t.db.execute_batch("CREATE TABLE blob (blob_id INTEGER PRIMARY KEY AUTOINCREMENT, blob_data TEXT)")
        .await
        .unwrap();

    let mut blob = Record::new("Blob").with("data", "raw");
    t.db.create_record(&mut blob, RelationScope::ALL).await.unwrap();

    let err = assert_err!(t.db.read_records("Blob").get(1).await);
    assert!(err.is_type_conversion());
}

#[tokio::test]
async fn belongs_to_by_a_field_other_than_the_key() {
    let mut builder = models!(Language);
    builder.register_model(
        schema::Model::new("Label", "label")
            .key("label_id", "id", ColumnType::Int)
            .column("label_language", ColumnType::String, "language")
            .belongs_to(schema::BelongsTo::new("language", "Language", "label_language").by("name")),
    );

    let t = setup(builder).await;
    t.db.execute_batch(
        "CREATE TABLE label (label_id INTEGER PRIMARY KEY, label_language TEXT);
         INSERT INTO label (label_id, label_language) VALUES (1, 'German');",
    )
    .await
    .unwrap();

    let mut german = Language {
        code: "de".to_string(),
        name: "German".to_string(),
    };
    t.db.create(&mut german, RelationScope::ALL).await.unwrap();

    // Not joined: the absent entity carries the stored name, not the code
    let label = assert_some!(t.db.read_records("Label").depth(1).get(1).await.unwrap());
    assert_eq!(label.value("language"), &Value::from(Entity::absent("Language", "German")));

    let label = assert_some!(t.db.read_records("Label").depth(2).get(1).await.unwrap());
    let language = label.value("language").expect_entity().expect_record();
    assert_eq!(language.value("code"), &Value::from("de"));
}
