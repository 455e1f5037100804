table! {
    chapters (id, work_id) {
        id -> Text,
        work_id -> Text,
        order_key -> Nullable<Double>,
        title -> Text,
        source_url -> Nullable<Text>,
        list_position -> Integer,
        scraped_at -> Timestamp,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    genres (id) {
        id -> Integer,
        name -> Text,
    }
}

table! {
    pages (id) {
        id -> Integer,
        work_id -> Text,
        chapter_id -> Text,
        ordinal -> Integer,
        image_url -> Text,
    }
}

table! {
    work_genres (work_id, genre_id) {
        work_id -> Text,
        genre_id -> Integer,
    }
}

table! {
    works (id) {
        id -> Text,
        title -> Text,
        source_name -> Text,
        source_url -> Text,
        cover_image_url -> Nullable<Text>,
        author -> Nullable<Text>,
        description -> Nullable<Text>,
        #[sql_name = "type"]
        kind -> Nullable<Text>,
        last_ingested_at -> Timestamp,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

joinable!(work_genres -> genres (genre_id));
joinable!(work_genres -> works (work_id));
joinable!(chapters -> works (work_id));

allow_tables_to_appear_in_same_query!(
    chapters,
    genres,
    pages,
    work_genres,
    works,
);
