use crate::database::{courses, run_blocking, SqlitePool};
use async_trait::async_trait;
use diesel::prelude::*;
use domain::{Course, CourseRepository, DomainError};

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct CourseModel {
    id: String,
    name: String,
    dept_name: String,
}

pub struct SqliteCourseRepository {
    pool: SqlitePool,
}

impl SqliteCourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for SqliteCourseRepository {
    async fn find_all(&self) -> Result<Vec<Course>, DomainError> {
        run_blocking(&self.pool, |conn| {
            let rows = courses::table
                .order(courses::name.asc())
                .select(CourseModel::as_select())
                .load::<CourseModel>(conn)?;
            Ok(rows
                .into_iter()
                .map(|m| Course {
                    id: m.id,
                    name: m.name,
                    dept_name: m.dept_name,
                })
                .collect())
        })
        .await
    }

    async fn save(&self, course: &Course) -> Result<Course, DomainError> {
        let model = CourseModel {
            id: course.id.clone(),
            name: course.name.clone(),
            dept_name: course.dept_name.clone(),
        };
        run_blocking(&self.pool, move |conn| {
            diesel::insert_into(courses::table)
                .values(&model)
                .on_conflict(courses::id)
                .do_update()
                .set(&model)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(course.clone())
    }
}
