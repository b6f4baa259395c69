diesel::table! {
    tasks (id) {
        id -> BigInt,
        name -> Text,
        description -> Text,
        date_added -> Text,
        due_date -> Text,
        plan_id -> BigInt,
        completed -> Bool,
    }
}
