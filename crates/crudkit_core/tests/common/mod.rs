#![allow(dead_code)]

use crudkit_core::{
    Entity, EntityMapping, GenericRepository, Repository, SqliteContextFactory, StoreConfig, Value,
};
use rusqlite::Row;
use std::sync::Arc;
use uuid::Uuid;

const PEOPLE_SCHEMA: &[&str] = &[
    "CREATE TABLE people (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        status TEXT,
        age INTEGER,
        nickname TEXT,
        email TEXT UNIQUE,
        created_at TEXT NOT NULL DEFAULT 'seeded'
    )",
    "CREATE TABLE pets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES people(id) ON DELETE CASCADE,
        name TEXT NOT NULL
    )",
    "CREATE TABLE devices (
        id TEXT PRIMARY KEY,
        label TEXT NOT NULL
    )",
];

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: Option<i64>,
    pub name: String,
    pub status: Option<String>,
    pub age: Option<i64>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

impl Person {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            status: None,
            age: None,
            nickname: None,
            email: None,
            created_at: None,
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn with_age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_nickname(mut self, nickname: &str) -> Self {
        self.nickname = Some(nickname.to_string());
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
}

impl Entity for Person {
    type Id = i64;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("name", Value::from(self.name.as_str())),
            ("status", Value::from(self.status.clone())),
            ("age", Value::from(self.age)),
            ("nickname", Value::from(self.nickname.clone())),
            ("email", Value::from(self.email.clone())),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            status: row.get("status")?,
            age: row.get("age")?,
            nickname: row.get("nickname")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: Uuid,
    pub label: String,
}

impl Entity for Device {
    type Id = Uuid;

    fn id(&self) -> Option<Uuid> {
        Some(self.id)
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![("label", Value::from(self.label.as_str()))]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw: String = row.get("id")?;
        let id = Uuid::parse_str(&raw).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
        })?;
        Ok(Self {
            id,
            label: row.get("label")?,
        })
    }
}

pub fn people_mapping() -> EntityMapping {
    EntityMapping::new("people")
        .property("createdAt", "created_at")
        .collection("pets", "pets", "owner_id")
}

pub fn device_mapping() -> EntityMapping {
    EntityMapping::new("devices")
}

pub fn memory_factory() -> Arc<SqliteContextFactory> {
    factory_with(StoreConfig::in_memory())
}

pub fn file_factory(path: &std::path::Path) -> Arc<SqliteContextFactory> {
    factory_with(StoreConfig::file(path))
}

pub fn factory_with(config: StoreConfig) -> Arc<SqliteContextFactory> {
    let factory = Arc::new(SqliteContextFactory::new(config).unwrap());
    install_schema(&factory);
    factory
}

pub fn install_schema(factory: &Arc<SqliteContextFactory>) {
    let repo = people_repo(factory);
    for statement in PEOPLE_SCHEMA {
        repo.native_execute(statement, &[]).unwrap();
    }
}

pub fn people_repo(factory: &Arc<SqliteContextFactory>) -> GenericRepository<Person> {
    GenericRepository::new(Arc::clone(factory), people_mapping())
}

pub fn device_repo(factory: &Arc<SqliteContextFactory>) -> GenericRepository<Device> {
    GenericRepository::new(Arc::clone(factory), device_mapping())
}

pub fn add_pet(factory: &Arc<SqliteContextFactory>, owner_id: i64, name: &str) {
    people_repo(factory)
        .native_execute(
            "INSERT INTO pets (owner_id, name) VALUES (?, ?)",
            &[Value::from(owner_id), Value::from(name)],
        )
        .unwrap();
}

pub fn names(people: &[Person]) -> Vec<String> {
    let mut names = people
        .iter()
        .map(|person| person.name.clone())
        .collect::<Vec<_>>();
    names.sort();
    names
}
