//! MongoDB event collection.
//!
//! Documents keep the GeoJSON `location` and native UTC datetimes so that the
//! `2dsphere` index and `$nearSphere` work on them directly.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    options::{
        ClientOptions, Credential, FindOneAndUpdateOptions, FindOptions, IndexOptions,
        ReturnDocument,
    },
    Client, Collection, Database, IndexModel,
};
use tracing::info;

use super::{CollectionError, EventCollection, FieldUpdate, Filter};
use crate::config::StorageConfig;
use crate::events::{EventDocument, EventKey, GeoPoint, POINT_TYPE};

/// Event collection on a MongoDB server.
#[derive(Clone)]
pub struct MongoCollection {
    database: Database,
    collection: Collection<Document>,
}

impl MongoCollection {
    /// Connect, verify the server answers and ensure the query indexes exist.
    pub async fn connect(config: &StorageConfig) -> Result<Self, CollectionError> {
        let mut options =
            ClientOptions::parse(format!("mongodb://{}:{}", config.host, config.port)).await?;
        options.app_name = Some("cephas".to_string());

        match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                info!(host = %config.host, port = config.port, user = %user, "Connecting with auth");
                options.credential = Some(
                    Credential::builder()
                        .username(user.clone())
                        .password(password.clone())
                        .build(),
                );
            }
            _ => info!(host = %config.host, port = config.port, "Connecting without auth"),
        }

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);
        let collection = database.collection::<Document>(&config.collection);

        let mongo = Self {
            database,
            collection,
        };
        mongo.ping().await?;
        mongo.ensure_indexes().await?;

        info!(
            database = %config.database,
            collection = %config.collection,
            "Connected to MongoDB"
        );
        Ok(mongo)
    }

    async fn ensure_indexes(&self) -> Result<(), CollectionError> {
        let key_index = IndexModel::builder()
            .keys(doc! { "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        let location_index = IndexModel::builder()
            .keys(doc! { "location": "2dsphere" })
            .build();

        self.collection.create_index(key_index, None).await?;
        self.collection.create_index(location_index, None).await?;
        Ok(())
    }
}

#[async_trait]
impl EventCollection for MongoCollection {
    async fn insert_one(&self, document: EventDocument) -> Result<(), CollectionError> {
        self.collection.insert_one(to_bson(&document), None).await?;
        Ok(())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<EventDocument>, CollectionError> {
        self.collection
            .find_one(filter_document(filter), None)
            .await?
            .map(|document| from_bson(&document))
            .transpose()
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<EventDocument>, CollectionError> {
        // $nearSphere already sorts by distance; plain queries keep natural order.
        let options = FindOptions::builder().projection(doc! { "_id": 0 }).build();
        let documents: Vec<Document> = self
            .collection
            .find(filter_document(filter), options)
            .await?
            .try_collect()
            .await?;
        documents.iter().map(from_bson).collect()
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: &FieldUpdate,
    ) -> Result<Option<EventDocument>, CollectionError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.collection
            .find_one_and_update(filter_document(filter), update_document(update), options)
            .await?
            .map(|document| from_bson(&document))
            .transpose()
    }

    async fn ping(&self) -> Result<(), CollectionError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BSON Mapping
// ═══════════════════════════════════════════════════════════════════════════════

fn datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(value)
}

fn location_bson(point: &GeoPoint) -> Document {
    let [longitude, latitude] = point.coordinates();
    doc! { "type": POINT_TYPE, "coordinates": [longitude, latitude] }
}

fn to_bson(document: &EventDocument) -> Document {
    let mut stored = doc! {
        "key": document.key.as_str(),
        "deleted": document.deleted,
        "begin_timestamp": datetime(document.begin_timestamp),
        "location": location_bson(&document.location),
        "description": document.description.as_str(),
    };
    if let Some(end) = document.end_timestamp {
        stored.insert("end_timestamp", datetime(end));
    }
    if let Some(last_updated) = document.last_updated {
        stored.insert("last_updated", datetime(last_updated));
    }
    stored
}

fn filter_document(filter: &Filter) -> Document {
    let mut query = Document::new();
    if let Some(key) = &filter.key {
        query.insert("key", key.as_str());
    }
    if let Some(deleted) = filter.deleted {
        query.insert("deleted", deleted);
    }
    if let Some(range) = &filter.begin_within {
        query.insert(
            "begin_timestamp",
            doc! { "$gte": datetime(range.start), "$lt": datetime(range.end) },
        );
    }
    if let Some(near) = &filter.near {
        let [longitude, latitude] = near.coordinates();
        query.insert(
            "location",
            doc! {
                "$nearSphere": {
                    "$geometry": { "type": POINT_TYPE, "coordinates": [longitude, latitude] },
                    "$maxDistance": near.max_distance,
                }
            },
        );
    }
    query
}

fn update_document(update: &FieldUpdate) -> Document {
    let mut set = doc! { "last_updated": datetime(update.last_updated) };
    if let Some(begin) = update.begin_timestamp {
        set.insert("begin_timestamp", datetime(begin));
    }
    if let Some(end) = update.end_timestamp {
        set.insert("end_timestamp", datetime(end));
    }
    if let Some(location) = &update.location {
        set.insert("location", location_bson(location));
    }
    if let Some(description) = &update.description {
        set.insert("description", description.as_str());
    }
    if let Some(deleted) = update.deleted {
        set.insert("deleted", deleted);
    }
    doc! { "$set": set }
}

fn malformed(error: impl std::fmt::Display) -> CollectionError {
    CollectionError::MalformedDocument(error.to_string())
}

fn optional_datetime(
    stored: &Document,
    field: &str,
) -> Result<Option<DateTime<Utc>>, CollectionError> {
    match stored.get(field) {
        None | Some(Bson::Null) => Ok(None),
        Some(Bson::DateTime(value)) => Ok(Some(value.to_chrono())),
        Some(other) => Err(malformed(format!("{} has type {:?}", field, other.element_type()))),
    }
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(v) => Some(*v),
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        _ => None,
    }
}

fn from_bson(stored: &Document) -> Result<EventDocument, CollectionError> {
    let key = stored.get_str("key").map_err(malformed)?;
    let location = stored.get_document("location").map_err(malformed)?;
    let point = match location.get_array("coordinates").map_err(malformed)?.as_slice() {
        [longitude, latitude] => number(longitude)
            .zip(number(latitude))
            .and_then(|(longitude, latitude)| GeoPoint::new(longitude, latitude)),
        _ => None,
    }
    .ok_or_else(|| malformed(format!("event {} has unusable coordinates", key)))?;

    Ok(EventDocument {
        key: EventKey::from(key),
        deleted: stored.get_bool("deleted").unwrap_or(false),
        begin_timestamp: stored
            .get_datetime("begin_timestamp")
            .map_err(malformed)?
            .to_chrono(),
        end_timestamp: optional_datetime(stored, "end_timestamp")?,
        location: point,
        description: stored.get_str("description").map_err(malformed)?.to_string(),
        last_updated: optional_datetime(stored, "last_updated")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NearPoint, TimeRange};
    use chrono::TimeZone;

    fn sample() -> EventDocument {
        EventDocument {
            key: EventKey::from("abc"),
            deleted: false,
            begin_timestamp: Utc.with_ymd_and_hms(2020, 11, 10, 9, 0, 0).unwrap(),
            end_timestamp: None,
            location: GeoPoint::new(-117.9, 33.8).unwrap(),
            description: "Parade".to_string(),
            last_updated: None,
        }
    }

    #[test]
    fn test_bson_mapping_round_trips() {
        let stored = to_bson(&sample());
        assert!(stored.get("end_timestamp").is_none());
        assert!(stored.get("last_updated").is_none());
        assert_eq!(from_bson(&stored).unwrap(), sample());
    }

    #[test]
    fn test_near_filter_places_max_distance_beside_geometry() {
        let filter = Filter::new()
            .with_deleted(false)
            .with_near(NearPoint::new(33.8, -117.9, 500.0));
        let query = filter_document(&filter);

        let near = query
            .get_document("location")
            .unwrap()
            .get_document("$nearSphere")
            .unwrap();
        assert_eq!(near.get_f64("$maxDistance").unwrap(), 500.0);
        let coordinates = near.get_document("$geometry").unwrap().get_array("coordinates").unwrap();
        assert_eq!(coordinates, &vec![Bson::Double(-117.9), Bson::Double(33.8)]);
        assert!(!query.get_bool("deleted").unwrap());
    }

    #[test]
    fn test_time_filter_is_half_open() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2020, 2, 1, 0, 0, 0).unwrap();
        let query = filter_document(&Filter::new().with_time_range(TimeRange::new(start, end)));
        let range = query.get_document("begin_timestamp").unwrap();
        assert!(range.contains_key("$gte"));
        assert!(range.contains_key("$lt"));
    }

    #[test]
    fn test_update_sets_only_present_fields() {
        let update = FieldUpdate::soft_delete(Utc::now());
        let set = update_document(&update);
        let fields = set.get_document("$set").unwrap();
        assert!(fields.get_bool("deleted").unwrap());
        assert!(fields.contains_key("last_updated"));
        assert!(!fields.contains_key("description"));
    }
}
