//! Named cache partitions and the entries stored in them.
//!
//! A partition is created on first `open`, written with last-write-wins
//! upserts keyed by request identity, and dropped as a whole by `delete`.
//! Cross-partition lookups search partitions in creation order.

use super::connection::CacheDb;
use crate::Error;
use crate::http::{Headers, Request, Response};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

/// Handle to one named partition.
#[derive(Clone, Debug)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

/// Metadata for one stored entry, without the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CachedEntry {
    pub partition: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body_len: usize,
    pub stored_at: String,
}

/// Partition name with its entry count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionInfo {
    pub name: String,
    pub entries: u64,
    pub created_at: String,
}

fn ensure_partition(conn: &rusqlite::Connection, name: &str) -> Result<i64, Error> {
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    let id = conn.query_row("SELECT id FROM partitions WHERE name = ?1", params![name], |row| row.get(0))?;
    Ok(id)
}

fn decode_response(status: u16, headers_json: &str, body: Vec<u8>) -> Result<Response, Error> {
    let headers: Headers =
        serde_json::from_str(headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
    Ok(Response { status, headers, body: Bytes::from(body) })
}

fn require_get(request: &Request) -> Result<(), Error> {
    if request.is_get() {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("cannot cache a {} request", request.method())))
    }
}

impl CacheDb {
    /// Open a partition, creating it if this is the first open of its name.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        let owned = name.to_string();
        self.conn
            .call(move |conn| -> Result<i64, Error> { ensure_partition(conn, &owned) })
            .await
            .map_err(Error::from)?;
        Ok(Partition { db: self.clone(), name: name.to_string() })
    }

    /// List partition names in creation order.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY id")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// List partitions with their entry counts, in creation order.
    pub async fn partitions(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, p.created_at, COUNT(e.key_hash)
                     FROM partitions p LEFT JOIN entries e ON e.partition_id = p.id
                     GROUP BY p.id ORDER BY p.id",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        let entries: i64 = row.get(2)?;
                        Ok(PartitionInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: u64::try_from(entries).unwrap_or_default(),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)", params![name], |row| {
                        row.get(0)
                    })?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns false if no partition had that name.
    pub async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Look a request up across all partitions, oldest partition first.
    ///
    /// Non-GET requests never match.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.cache_key();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body
                         FROM entries e JOIN partitions p ON p.id = e.partition_id
                         WHERE e.key_hash = ?1
                         ORDER BY p.id LIMIT 1",
                        params![key],
                        |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                row.map(|(status, headers, body)| decode_response(status, &headers, body)).transpose()
            })
            .await
            .map_err(Error::from)
    }
}

impl Partition {
    /// Look a request up in this partition only.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = request.cache_key();
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body
                         FROM entries e JOIN partitions p ON p.id = e.partition_id
                         WHERE p.name = ?1 AND e.key_hash = ?2",
                        params![name, key],
                        |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                row.map(|(status, headers, body)| decode_response(status, &headers, body)).transpose()
            })
            .await
            .map_err(Error::from)
    }

    /// Store a response under the request's identity, replacing any
    /// previous entry.
    ///
    /// Only GET requests can be stored. Writing to a partition that was
    /// deleted after this handle was opened recreates it.
    pub async fn put(&self, request: &Request, response: &Response) -> Result<(), Error> {
        self.put_all(vec![(request.clone(), response.clone())]).await
    }

    /// Store several entries in one transaction: either all land or none do.
    pub async fn put_all(&self, pairs: Vec<(Request, Response)>) -> Result<(), Error> {
        for (request, _) in &pairs {
            require_get(request)?;
        }

        let mut rows = Vec::with_capacity(pairs.len());
        for (request, response) in pairs {
            let headers_json = serde_json::to_string(&response.headers)
                .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
            rows.push((request.cache_key(), request.method().to_string(), request.url.to_string(), response, headers_json));
        }

        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let partition_id = ensure_partition(&tx, &name)?;
                let stored_at = chrono::Utc::now().to_rfc3339();
                for (key, method, url, response, headers_json) in &rows {
                    tx.execute(
                        "INSERT INTO entries (partition_id, key_hash, method, url, status, headers_json, body, stored_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT(partition_id, key_hash) DO UPDATE SET
                            status = excluded.status,
                            headers_json = excluded.headers_json,
                            body = excluded.body,
                            stored_at = excluded.stored_at",
                        params![
                            partition_id,
                            key,
                            method,
                            url,
                            response.status,
                            headers_json,
                            response.body.as_ref(),
                            stored_at
                        ],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Entry metadata in this partition, in URL order.
    pub async fn entries(&self) -> Result<Vec<CachedEntry>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url, e.status, e.headers_json, LENGTH(e.body), e.stored_at
                     FROM entries e JOIN partitions p ON p.id = e.partition_id
                     WHERE p.name = ?1 ORDER BY e.url",
                )?;
                let raw = stmt
                    .query_map(params![name], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, u16>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, i64>(4)?,
                            row.get::<_, String>(5)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                raw.into_iter()
                    .map(|(method, url, status, headers_json, body_len, stored_at)| {
                        let headers: Headers = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
                        Ok(CachedEntry {
                            partition: name.clone(),
                            method,
                            url,
                            status,
                            content_type: headers.get("content-type").map(str::to_string),
                            body_len: usize::try_from(body_len).unwrap_or_default(),
                            stored_at,
                        })
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    pub async fn len(&self) -> Result<u64, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e JOIN partitions p ON p.id = e.partition_id WHERE p.name = ?1",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(u64::try_from(count).unwrap_or_default())
            })
            .await
            .map_err(Error::from)
    }
}
