//! Shared test mapping: artists, paintings and galleries.

use std::sync::Arc;

use cay_map::{
    CollectionType, DataMap, DbAttribute, DbEntity, DbRelationship, ObjAttribute, ObjEntity,
    ObjRelationship, SqlType,
};
use cay_runtime::{DataRow, EntityResolver, InMemoryDataChannel, InMemoryObjectContext};
use cay_types::ObjectId;

pub(crate) fn data_map() -> DataMap {
    let mut map = DataMap::new("gallery");
    map.add_db_entity(
        DbEntity::new("ARTIST")
            .with_attribute(DbAttribute::new("ARTIST_ID", SqlType::Bigint).primary_key())
            .with_attribute(DbAttribute::new("NAME", SqlType::Varchar))
            .with_relationship(
                DbRelationship::new("paintingArray", "ARTIST", "PAINTING")
                    .to_many()
                    .join("ARTIST_ID", "ARTIST_ID"),
            ),
    )
    .unwrap();
    map.add_db_entity(
        DbEntity::new("PAINTING")
            .with_attribute(DbAttribute::new("PAINTING_ID", SqlType::Bigint).primary_key())
            .with_attribute(DbAttribute::new("ARTIST_ID", SqlType::Bigint))
            .with_attribute(DbAttribute::new("GALLERY_ID", SqlType::Bigint))
            .with_attribute(DbAttribute::new("TITLE", SqlType::Varchar))
            .with_relationship(
                DbRelationship::new("toArtist", "PAINTING", "ARTIST").join("ARTIST_ID", "ARTIST_ID"),
            )
            .with_relationship(
                DbRelationship::new("toGallery", "PAINTING", "GALLERY")
                    .join("GALLERY_ID", "GALLERY_ID"),
            ),
    )
    .unwrap();
    map.add_db_entity(
        DbEntity::new("GALLERY")
            .with_attribute(DbAttribute::new("GALLERY_ID", SqlType::Bigint).primary_key())
            .with_attribute(DbAttribute::new("NAME", SqlType::Varchar))
            .with_relationship(
                DbRelationship::new("paintingArray", "GALLERY", "PAINTING")
                    .to_many()
                    .join("GALLERY_ID", "GALLERY_ID"),
            ),
    )
    .unwrap();

    map.add_obj_entity(
        ObjEntity::new("Artist")
            .mapped_to("ARTIST")
            .with_attribute(ObjAttribute::new("name").db_path("NAME"))
            .with_relationship(
                ObjRelationship::new("paintings")
                    .target("Painting")
                    .via("paintingArray"),
            )
            .with_relationship(
                ObjRelationship::new("paintingsByTitle")
                    .target("Painting")
                    .via("paintingArray")
                    .keyed_by("title"),
            ),
    )
    .unwrap();
    map.add_obj_entity(
        ObjEntity::new("Painting")
            .mapped_to("PAINTING")
            .with_attribute(ObjAttribute::new("title").db_path("TITLE"))
            .with_relationship(ObjRelationship::new("artist").target("Artist").via("toArtist"))
            .with_relationship(ObjRelationship::new("gallery").target("Gallery").via("toGallery")),
    )
    .unwrap();
    map.add_obj_entity(
        ObjEntity::new("Gallery")
            .mapped_to("GALLERY")
            .with_attribute(ObjAttribute::new("name").db_path("NAME"))
            .with_relationship(
                ObjRelationship::new("paintings")
                    .target("Painting")
                    .via("paintingArray")
                    .collection(CollectionType::Set),
            ),
    )
    .unwrap();
    map
}

pub(crate) fn artist_id(v: i64) -> ObjectId {
    ObjectId::new("Artist", "ARTIST_ID", v)
}

pub(crate) fn painting_id(v: i64) -> ObjectId {
    ObjectId::new("Painting", "PAINTING_ID", v)
}

pub(crate) fn gallery_id(v: i64) -> ObjectId {
    ObjectId::new("Gallery", "GALLERY_ID", v)
}

pub(crate) fn resolver() -> Arc<EntityResolver> {
    Arc::new(EntityResolver::new(data_map()))
}

/// Monet (1) painted Water Lilies (10) and Impression (11), both hanging
/// in the Louvre (100). Picasso (2) has no paintings.
pub(crate) fn channel() -> Arc<InMemoryDataChannel> {
    let channel = InMemoryDataChannel::new();
    let monet_paintings = vec![painting_id(10), painting_id(11)];
    channel.insert(
        artist_id(1),
        DataRow::new()
            .attribute("name", "Monet")
            .to_many("paintings", monet_paintings.clone())
            .to_many("paintingsByTitle", monet_paintings.clone()),
    );
    channel.insert(
        artist_id(2),
        DataRow::new()
            .attribute("name", "Picasso")
            .to_many("paintings", vec![])
            .to_many("paintingsByTitle", vec![]),
    );
    for (id, title) in [(10, "Water Lilies"), (11, "Impression")] {
        channel.insert(
            painting_id(id),
            DataRow::new()
                .attribute("title", title)
                .to_one("artist", Some(artist_id(1)))
                .to_one("gallery", Some(gallery_id(100))),
        );
    }
    channel.insert(
        gallery_id(100),
        DataRow::new()
            .attribute("name", "Louvre")
            .to_many("paintings", monet_paintings),
    );
    Arc::new(channel)
}

/// A fresh context over [`channel`], returned with the channel so tests can
/// count fetches.
pub(crate) fn context() -> (InMemoryObjectContext, Arc<InMemoryDataChannel>) {
    let channel = channel();
    let context = InMemoryObjectContext::new(resolver(), channel.clone());
    (context, channel)
}
