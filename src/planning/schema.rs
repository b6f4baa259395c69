diesel::table! {
    plans (id) {
        id -> BigInt,
        title -> Text,
        create_date -> Nullable<Text>,
        end_date -> Nullable<Text>,
        status -> Text,
        completed_date -> Nullable<Text>,
    }
}
