use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::models::{BusinessProfile, PlatformInfo};

// Shared behind the server state, hence the mutex; profile reads are short
// point lookups.
pub struct ProfileStore {
    conn: Mutex<Connection>,
}

impl ProfileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_db()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS business_profiles (
                id INTEGER PRIMARY KEY,
                slug TEXT UNIQUE NOT NULL,
                subdomain TEXT,
                qr_token TEXT,
                business_name TEXT NOT NULL,
                business_type TEXT NOT NULL,
                location TEXT NOT NULL,
                description TEXT,
                keywords TEXT,
                owner_name TEXT,
                phone TEXT,
                email TEXT,
                website TEXT,
                platforms_json TEXT,
                language_pref_json TEXT,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_profiles_subdomain ON business_profiles(subdomain);
            CREATE INDEX IF NOT EXISTS idx_profiles_qr_token ON business_profiles(qr_token);
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another request panicked mid-read;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn save(&self, profile: &BusinessProfile) -> Result<()> {
        let platforms_json = serde_json::to_string(&profile.platforms)?;
        let language_pref_json = serde_json::to_string(&profile.language_pref)?;
        let conn = self.lock();
        conn.execute(
            r#"
            INSERT INTO business_profiles (
                slug, subdomain, qr_token, business_name, business_type, location,
                description, keywords, owner_name, phone, email, website,
                platforms_json, language_pref_json, is_active
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(slug) DO UPDATE SET
                subdomain = excluded.subdomain,
                qr_token = excluded.qr_token,
                business_name = excluded.business_name,
                business_type = excluded.business_type,
                location = excluded.location,
                description = excluded.description,
                keywords = excluded.keywords,
                owner_name = excluded.owner_name,
                phone = excluded.phone,
                email = excluded.email,
                website = excluded.website,
                platforms_json = excluded.platforms_json,
                language_pref_json = excluded.language_pref_json,
                is_active = excluded.is_active
            "#,
            params![
                profile.slug,
                profile.subdomain,
                profile.qr_token,
                profile.business_name,
                profile.business_type,
                profile.location,
                profile.description,
                profile.keywords,
                profile.owner_name,
                profile.phone,
                profile.email,
                profile.website,
                platforms_json,
                language_pref_json,
                profile.is_active as i64,
            ],
        )?;
        Ok(())
    }

    // One lookup serves slugs, subdomain aliases and QR tokens alike.
    pub fn lookup(&self, identifier: &str) -> Result<Option<BusinessProfile>> {
        let conn = self.lock();
        let result = conn.query_row(
            r#"
            SELECT slug, subdomain, qr_token, business_name, business_type, location,
                   description, keywords, owner_name, phone, email, website,
                   platforms_json, language_pref_json, is_active
            FROM business_profiles
            WHERE slug = ?1 OR subdomain = ?1 OR qr_token = ?1
            "#,
            params![identifier],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                    row.get::<_, Option<String>>(9)?,
                    row.get::<_, Option<String>>(10)?,
                    row.get::<_, Option<String>>(11)?,
                    row.get::<_, Option<String>>(12)?,
                    row.get::<_, Option<String>>(13)?,
                    row.get::<_, i64>(14)?,
                ))
            },
        );

        match result {
            Ok((
                slug,
                subdomain,
                qr_token,
                business_name,
                business_type,
                location,
                description,
                keywords,
                owner_name,
                phone,
                email,
                website,
                platforms_json,
                language_pref_json,
                is_active,
            )) => {
                // Malformed JSON columns degrade to empty, never to an error.
                let platforms: Vec<PlatformInfo> = platforms_json
                    .as_deref()
                    .and_then(|j| serde_json::from_str(j).ok())
                    .unwrap_or_default();
                let language_pref: Vec<String> = language_pref_json
                    .as_deref()
                    .and_then(|j| serde_json::from_str(j).ok())
                    .unwrap_or_default();

                Ok(Some(BusinessProfile {
                    slug,
                    subdomain,
                    qr_token,
                    business_name,
                    business_type,
                    location,
                    description,
                    keywords,
                    owner_name,
                    phone,
                    email,
                    website,
                    platforms,
                    language_pref,
                    is_active: is_active != 0,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
