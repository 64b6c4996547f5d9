//! Shared fixture schema for integration tests
#![allow(dead_code)]

use riptide::model::{Column, DataType, ReferentialAction, Relation, Schema, Table};

/// `users` and `posts`, with `posts.author` a single relation to `users`
pub fn blog_schema() -> Schema {
    Schema::new([
        Table::new("users")
            .column(Column::new("Id", DataType::Serial))
            .column(Column::new("Name", DataType::Varchar).length(80).not_null())
            .column(Column::new("Email", DataType::Varchar).length(120))
            .column(Column::new("Age", DataType::Integer))
            .column(Column::new("Balance", DataType::Decimal).precision(12, 2))
            .primary_key(["Id"])
            .unique("users_email_key", ["Email"])
            .relation(Relation::multiple("posts", "posts").on("Id", "AuthorId"))
            .build()
            .expect("users table"),
        Table::new("posts")
            .column(Column::new("Id", DataType::Uuid).default_generator("uuid"))
            .column(Column::new("AuthorId", DataType::Integer).not_null())
            .column(Column::new("Title", DataType::Text).not_null())
            .column(Column::new("Published", DataType::Boolean))
            .primary_key(["Id"])
            .relation(
                Relation::single("author", "users")
                    .on("AuthorId", "Id")
                    .on_delete(ReferentialAction::Cascade),
            )
            .build()
            .expect("posts table"),
    ])
    .expect("blog schema")
}
