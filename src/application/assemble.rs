//! Projection of backend documents into response models.

use movies_api_types::{
    FilmDetail, FilmGenre, FilmPerson, FilmSummary, GenreDetail, GenreSummary, PersonDetail,
};

use crate::domain::{
    entities::{FilmDocument, GenreDocument, NestedRef, PersonDocument, RawRecord},
    error::DomainError,
    types::EntityKind,
};

pub fn film_detail(record: RawRecord) -> Result<FilmDetail, DomainError> {
    let doc = expect_film(record)?;
    Ok(FilmDetail {
        uuid: doc.id,
        title: doc.title,
        imdb_rating: doc.imdb_rating,
        description: doc.description.unwrap_or_default(),
        genre: doc
            .genre
            .unwrap_or_default()
            .into_iter()
            .map(|NestedRef { id, name }| FilmGenre { uuid: id, name })
            .collect(),
        actors: persons(doc.actors),
        writers: persons(doc.writers),
        directors: persons(doc.director),
    })
}

pub fn film_summary(record: RawRecord) -> Result<FilmSummary, DomainError> {
    let doc = expect_film(record)?;
    Ok(FilmSummary {
        uuid: doc.id,
        title: doc.title,
        imdb_rating: doc.imdb_rating,
    })
}

pub fn genre_detail(record: RawRecord) -> Result<GenreDetail, DomainError> {
    let doc = expect_genre(record)?;
    Ok(GenreDetail {
        uuid: doc.id,
        name: doc.name,
        description: doc.description.unwrap_or_default(),
    })
}

pub fn genre_summary(record: RawRecord) -> Result<GenreSummary, DomainError> {
    let doc = expect_genre(record)?;
    Ok(GenreSummary {
        uuid: doc.id,
        name: doc.name,
    })
}

pub fn person_detail(record: RawRecord) -> Result<PersonDetail, DomainError> {
    let doc = expect_person(record)?;
    Ok(PersonDetail {
        uuid: doc.id,
        full_name: doc.full_name,
        role: doc.roles.unwrap_or_default(),
        film_ids: doc.film_ids.unwrap_or_default(),
    })
}

/// Apply `assemble` to every record, failing on the first mismatch.
pub fn many<T>(
    records: Vec<RawRecord>,
    assemble: fn(RawRecord) -> Result<T, DomainError>,
) -> Result<Vec<T>, DomainError> {
    records.into_iter().map(assemble).collect()
}

fn persons(refs: Option<Vec<NestedRef>>) -> Vec<FilmPerson> {
    refs.unwrap_or_default()
        .into_iter()
        .map(|NestedRef { id, name }| FilmPerson {
            uuid: id,
            full_name: name,
        })
        .collect()
}

fn expect_film(record: RawRecord) -> Result<FilmDocument, DomainError> {
    match record {
        RawRecord::Film(doc) => Ok(doc),
        other => Err(mismatch(EntityKind::Film, &other)),
    }
}

fn expect_genre(record: RawRecord) -> Result<GenreDocument, DomainError> {
    match record {
        RawRecord::Genre(doc) => Ok(doc),
        other => Err(mismatch(EntityKind::Genre, &other)),
    }
}

fn expect_person(record: RawRecord) -> Result<PersonDocument, DomainError> {
    match record {
        RawRecord::Person(doc) => Ok(doc),
        other => Err(mismatch(EntityKind::Person, &other)),
    }
}

fn mismatch(expected: EntityKind, record: &RawRecord) -> DomainError {
    DomainError::kind_mismatch(expected, record.kind(), record.id())
}
