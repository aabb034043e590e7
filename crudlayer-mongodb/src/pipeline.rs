//! Renders a [`SearchPipeline`] as a MongoDB aggregation.
//!
//! The aggregation always has three stages:
//!
//! ```text
//! [
//!   { $match: <filter> },
//!   { $facet: {
//!       paginate_result: [ { $sort }, { $skip }, { $limit } ],
//!       match_result: [ { $count: "total" } ],
//!   } },
//!   { $project: {
//!       count: { $size: "$paginate_result" },
//!       total: { $ifNull: [ { $first: "$match_result.total" }, 0 ] },
//!       data: "$paginate_result",
//!   } },
//! ]
//! ```
//!
//! so both the window and the total match count come back as one record.

use bson::{Document, doc};

use crudlayer_core::{error::StoreError, pipeline::SearchPipeline};

use crate::query::MongoQueryTranslator;

pub(crate) const PAGINATE_FACET: &str = "paginate_result";
pub(crate) const MATCH_FACET: &str = "match_result";

pub(crate) fn render_pipeline(pipeline: &SearchPipeline) -> Result<Vec<Document>, StoreError> {
    let filter = MongoQueryTranslator::translate(&pipeline.filter)?;

    let mut paginate = Vec::with_capacity(3);
    if !pipeline.sort.is_empty() {
        let mut sort = Document::new();
        for key in &pipeline.sort {
            sort.insert(key.field.clone(), key.direction.as_i32());
        }
        paginate.push(doc! { "$sort": sort });
    }
    paginate.push(doc! { "$skip": clamp_i64(pipeline.skip) });
    if let Some(limit) = pipeline.limit {
        paginate.push(doc! { "$limit": clamp_i64(limit) });
    }

    Ok(vec![
        doc! { "$match": filter },
        doc! {
            "$facet": {
                PAGINATE_FACET: paginate,
                MATCH_FACET: [{ "$count": "total" }],
            }
        },
        doc! {
            "$project": {
                "count": { "$size": format!("${PAGINATE_FACET}") },
                "total": { "$ifNull": [{ "$first": format!("${MATCH_FACET}.total") }, 0] },
                "data": format!("${PAGINATE_FACET}"),
            }
        },
    ])
}

/// Windows beyond `i64::MAX` rows select nothing either way.
fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::Bson;
    use crudlayer_core::{
        matching::MatchOption,
        pipeline::{SearchPipelineBuilder, SortKey},
    };

    #[test]
    fn renders_match_facet_and_projection() {
        let pipeline = SearchPipelineBuilder::new()
            .sorted_by(vec![SortKey::asc("title"), SortKey::asc("author")])
            .unwrap()
            .match_field("title", &MatchOption::partial("rust"))
            .unwrap()
            .skip(10)
            .limit(10)
            .build();

        let stages = render_pipeline(&pipeline).unwrap();

        assert_eq!(
            stages,
            vec![
                doc! { "$match": { "$and": [
                    { "title": { "$regex": "rust", "$options": "i" } },
                ] } },
                doc! { "$facet": {
                    "paginate_result": [
                        { "$sort": { "title": 1, "author": 1 } },
                        { "$skip": 10_i64 },
                        { "$limit": 10_i64 },
                    ],
                    "match_result": [{ "$count": "total" }],
                } },
                doc! { "$project": {
                    "count": { "$size": "$paginate_result" },
                    "total": { "$ifNull": [{ "$first": "$match_result.total" }, 0] },
                    "data": "$paginate_result",
                } },
            ]
        );
    }

    #[test]
    fn window_past_i64_range_is_clamped() {
        let skip = ((i64::MAX / 5) as u64 - 1).saturating_mul(10);
        let pipeline = SearchPipelineBuilder::new().skip(skip).limit(10).build();

        let stages = render_pipeline(&pipeline).unwrap();

        let paginate = stages[1]
            .get_document("$facet")
            .unwrap()
            .get_array(PAGINATE_FACET)
            .unwrap();
        assert_eq!(paginate[0], Bson::Document(doc! { "$skip": i64::MAX }));
        assert_eq!(paginate[1], Bson::Document(doc! { "$limit": 10_i64 }));
    }

    #[test]
    fn unfiltered_search_matches_everything_without_sort() {
        let stages = render_pipeline(&SearchPipelineBuilder::new().build()).unwrap();

        assert_eq!(stages[0], doc! { "$match": {} });
        assert_eq!(
            stages[1].get_document("$facet").unwrap().get_array(PAGINATE_FACET).unwrap().len(),
            1
        );
    }
}
