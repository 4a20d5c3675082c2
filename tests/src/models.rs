//! Hand-written models shared by the integration tests.

use chrono::{DateTime, Utc};
use strata::{
    schema::{self, Column, ColumnType},
    stmt::{Direction, Record},
    BelongsTo, HasMany, Model, OwnsOne, Result,
};

/// Tables of every model below.
pub const SCHEMA: &str = "
CREATE TABLE tag (
    tag_id INTEGER PRIMARY KEY AUTOINCREMENT
);

CREATE TABLE tag_l11n (
    tag_l11n_id INTEGER PRIMARY KEY AUTOINCREMENT,
    tag_l11n_tag INTEGER,
    tag_l11n_title TEXT,
    tag_l11n_lang TEXT
);

CREATE TABLE app_user (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_name TEXT,
    user_profile INTEGER
);

CREATE TABLE profile (
    profile_id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_bio TEXT,
    profile_user INTEGER
);

CREATE TABLE account_group (
    group_id INTEGER PRIMARY KEY AUTOINCREMENT,
    group_name TEXT
);

CREATE TABLE account (
    account_id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_name TEXT,
    account_score REAL,
    account_active INTEGER,
    account_created TEXT,
    account_settings TEXT
);

CREATE TABLE group_account (
    group_account_group INTEGER,
    group_account_account INTEGER
);

CREATE TABLE language (
    language_code TEXT PRIMARY KEY,
    language_name TEXT
);
";

#[derive(Debug, Default)]
pub struct Tag {
    pub id: i64,
    pub l11n: HasMany<TagL11n>,
}

impl Model for Tag {
    const NAME: &'static str = "Tag";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "tag")
            .key("tag_id", "id", ColumnType::Int)
            .has_many(
                schema::HasMany::inline("l11n", TagL11n::NAME, "tag_l11n", "tag_l11n_tag")
                    .sort("tag_l11n_id", Direction::Asc),
            )
    }

    fn load(mut record: Record) -> Result<Tag> {
        Ok(Tag {
            id: record.load("id")?,
            l11n: HasMany::load(record.remove("l11n"))?,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(Self::NAME).with("id", self.id);
        if let Some(l11n) = self.l11n.to_value() {
            record.set("l11n", l11n);
        }
        record
    }
}

#[derive(Debug, Default)]
pub struct TagL11n {
    pub id: i64,
    pub tag: i64,
    pub title: String,
    pub lang: String,
}

impl TagL11n {
    pub fn new(title: &str, lang: &str) -> TagL11n {
        TagL11n {
            title: title.to_string(),
            lang: lang.to_string(),
            ..TagL11n::default()
        }
    }
}

impl Model for TagL11n {
    const NAME: &'static str = "TagL11n";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "tag_l11n")
            .key("tag_l11n_id", "id", ColumnType::Int)
            .column("tag_l11n_tag", ColumnType::Int, "tag")
            .column("tag_l11n_title", ColumnType::String, "title")
            .column("tag_l11n_lang", ColumnType::String, "lang")
    }

    fn load(mut record: Record) -> Result<TagL11n> {
        Ok(TagL11n {
            id: record.load("id")?,
            tag: record.load::<Option<i64>>("tag")?.unwrap_or_default(),
            title: record.load("title")?,
            lang: record.load("lang")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with("id", self.id)
            .with("tag", self.tag)
            .with("title", &self.title)
            .with("lang", &self.lang)
    }
}

/// Owns its profile; the profile points back at it.
#[derive(Debug, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub profile: OwnsOne<Profile>,
}

impl Model for User {
    const NAME: &'static str = "User";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "app_user")
            .key("user_id", "id", ColumnType::Int)
            .column_def(Column::new("user_name", ColumnType::String, "name").autocomplete())
            .column("user_profile", ColumnType::Int, "profile")
            .owns_one(schema::OwnsOne::new("profile", Profile::NAME, "user_profile"))
    }

    fn load(mut record: Record) -> Result<User> {
        Ok(User {
            id: record.load("id")?,
            name: record.load::<Option<String>>("name")?.unwrap_or_default(),
            profile: OwnsOne::load(record.remove("profile"))?,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(Self::NAME)
            .with("id", self.id)
            .with("name", &self.name);
        if let Some(profile) = self.profile.to_value() {
            record.set("profile", profile);
        }
        record
    }
}

#[derive(Debug, Default)]
pub struct Profile {
    pub id: i64,
    pub bio: String,
    pub user: BelongsTo<User>,
}

impl Model for Profile {
    const NAME: &'static str = "Profile";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "profile")
            .key("profile_id", "id", ColumnType::Int)
            .column("profile_bio", ColumnType::String, "bio")
            .column("profile_user", ColumnType::Int, "user")
            .belongs_to(schema::BelongsTo::new("user", User::NAME, "profile_user"))
    }

    fn load(mut record: Record) -> Result<Profile> {
        Ok(Profile {
            id: record.load("id")?,
            bio: record.load::<Option<String>>("bio")?.unwrap_or_default(),
            user: BelongsTo::load(record.remove("user"))?,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(Self::NAME)
            .with("id", self.id)
            .with("bio", &self.bio);
        if let Some(user) = self.user.to_value() {
            record.set("user", user);
        }
        record
    }
}

/// Links accounts through the `group_account` join table.
#[derive(Debug, Default)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub accounts: HasMany<Account>,
}

impl Model for Group {
    const NAME: &'static str = "Group";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "account_group")
            .key("group_id", "id", ColumnType::Int)
            .column("group_name", ColumnType::String, "name")
            .has_many(schema::HasMany::through(
                "accounts",
                Account::NAME,
                "group_account",
                "group_account_group",
                "group_account_account",
            ))
    }

    fn load(mut record: Record) -> Result<Group> {
        Ok(Group {
            id: record.load("id")?,
            name: record.load::<Option<String>>("name")?.unwrap_or_default(),
            accounts: HasMany::load(record.remove("accounts"))?,
        })
    }

    fn to_record(&self) -> Record {
        let mut record = Record::new(Self::NAME)
            .with("id", self.id)
            .with("name", &self.name);
        if let Some(accounts) = self.accounts.to_value() {
            record.set("accounts", accounts);
        }
        record
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub score: f64,
    pub active: bool,
    pub created: Option<DateTime<Utc>>,
    pub settings: serde_json::Value,
}

impl Account {
    pub fn new(name: &str) -> Account {
        Account {
            name: name.to_string(),
            ..Account::default()
        }
    }
}

impl Model for Account {
    const NAME: &'static str = "Account";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "account")
            .key("account_id", "id", ColumnType::Int)
            .column_def(Column::new("account_name", ColumnType::String, "name").autocomplete())
            .column("account_score", ColumnType::Float, "score")
            .column("account_active", ColumnType::Bool, "active")
            .column("account_created", ColumnType::DateTime, "created")
            .column("account_settings", ColumnType::Json, "settings")
    }

    fn load(mut record: Record) -> Result<Account> {
        Ok(Account {
            id: record.load("id")?,
            name: record.load("name")?,
            score: record.load::<Option<f64>>("score")?.unwrap_or_default(),
            active: record.load::<Option<bool>>("active")?.unwrap_or_default(),
            created: record.load("created")?,
            settings: record.load("settings")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with("id", self.id)
            .with("name", &self.name)
            .with("score", self.score)
            .with("active", self.active)
            .with("created", self.created)
            .with("settings", self.settings.clone())
    }
}

/// Keyed by a code the caller picks.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Model for Language {
    const NAME: &'static str = "Language";

    fn schema() -> schema::Model {
        schema::Model::new(Self::NAME, "language")
            .key("language_code", "code", ColumnType::String)
            .auto(false)
            .column("language_name", ColumnType::String, "name")
    }

    fn load(mut record: Record) -> Result<Language> {
        Ok(Language {
            code: record.load("code")?,
            name: record.load("name")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(Self::NAME)
            .with("code", &self.code)
            .with("name", &self.name)
    }
}
