use enrollment_core::db::open_db;
use enrollment_core::{
    Caller, CourseRepository, CourseRequest, EnrollmentError, EnrollmentService, EntityStore,
    ProfileInput, RelationshipRepository, RepoError, SqliteStore, MAX_COURSES_PER_TEACHER,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

const WORKERS: usize = 6;

fn admin() -> Caller {
    Caller::admin(1)
}

/// Runs `work` on `WORKERS` threads, each with its own connection, released
/// together by a barrier.
fn race<F>(path: &Path, work: F) -> Vec<Result<(), EnrollmentError>>
where
    F: Fn(&EnrollmentService<SqliteStore<'_>>, usize) -> Result<(), EnrollmentError>
        + Send
        + Sync
        + 'static,
{
    let barrier = Arc::new(Barrier::new(WORKERS));
    let work = Arc::new(work);
    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let path: PathBuf = path.to_path_buf();
            let barrier = Arc::clone(&barrier);
            let work = Arc::clone(&work);
            thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
                barrier.wait();
                work(&service, worker)
            })
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect()
}

#[test]
fn last_seat_goes_to_exactly_one_caller() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race.db");

    let (course, students) = {
        let conn = open_db(&path).unwrap();
        let service = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
        let course = service
            .create_course(&admin(), &CourseRequest::new("Contested").max_students(3))
            .unwrap()
            .course
            .id;
        let students: Vec<i64> = (0..WORKERS + 2)
            .map(|index| {
                service
                    .create_student(&admin(), &ProfileInput::named(format!("s{index}")))
                    .unwrap()
                    .student
                    .id
            })
            .collect();
        for student in &students[..2] {
            service
                .add_student_to_course(course, *student, &admin())
                .unwrap();
        }
        (course, students)
    };

    let contenders: Arc<Vec<i64>> = Arc::new(students[2..].to_vec());
    let results = race(&path, move |service, worker| {
        service
            .add_student_to_course(course, contenders[worker], &admin())
            .map(|_| ())
    });

    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    for result in &results {
        if let Err(err) = result {
            assert!(
                matches!(err, EnrollmentError::ValidationFailed(_)),
                "unexpected error: {err}"
            );
        }
    }

    let conn = open_db(&path).unwrap();
    let service = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    assert_eq!(service.get_course(course).unwrap().enrolled_student_ids.len(), 3);
}

#[test]
fn teacher_cap_holds_under_concurrent_assignment() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("teacher-race.db");

    let (teacher, open_courses) = {
        let conn = open_db(&path).unwrap();
        let service = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
        let teacher = service
            .create_teacher(&admin(), &ProfileInput::named("Popular"))
            .unwrap()
            .teacher
            .id;
        for index in 0..MAX_COURSES_PER_TEACHER - 1 {
            service
                .create_course(
                    &admin(),
                    &CourseRequest::new(format!("Taught {index}")).teacher(teacher),
                )
                .unwrap();
        }
        let open_courses: Vec<i64> = (0..WORKERS)
            .map(|index| {
                service
                    .create_course(&admin(), &CourseRequest::new(format!("Open {index}")))
                    .unwrap()
                    .course
                    .id
            })
            .collect();
        (teacher, open_courses)
    };

    let targets = Arc::new(open_courses);
    let results = race(&path, move |service, worker| {
        service
            .assign_teacher_to_course(&admin(), teacher, targets[worker])
            .map(|_| ())
    });

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);

    let conn = open_db(&path).unwrap();
    let service = EnrollmentService::new(SqliteStore::try_new(&conn).unwrap());
    assert_eq!(
        service.get_teacher(teacher).unwrap().course_ids.len(),
        MAX_COURSES_PER_TEACHER
    );
}

#[test]
fn snapshot_read_does_not_observe_concurrent_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snapshot.db");

    let reader_conn = open_db(&path).unwrap();
    let writer_conn = open_db(&path).unwrap();
    writer_conn.busy_timeout(Duration::from_millis(50)).unwrap();
    let reader = SqliteStore::try_new(&reader_conn).unwrap();
    let writer = EnrollmentService::new(SqliteStore::try_new(&writer_conn).unwrap());

    let course = writer
        .create_course(&admin(), &CourseRequest::new("Snapshot").max_students(2))
        .unwrap()
        .course
        .id;
    let student = writer
        .create_student(&admin(), &ProfileInput::named("Late"))
        .unwrap()
        .student
        .id;

    reader
        .read_snapshot(|store| -> Result<(), RepoError> {
            let before = store.get_course(course)?.unwrap();
            let enrolled_before = store.enrolled_student_ids(course)?;

            let _ = writer.update_course(
                &admin(),
                course,
                &CourseRequest::new("Snapshot").max_students(5),
            );
            let _ = writer.add_student_to_course(course, student, &admin());

            assert_eq!(store.get_course(course)?.unwrap(), before);
            assert_eq!(store.enrolled_student_ids(course)?, enrolled_before);
            Ok(())
        })
        .unwrap();

    let _ = writer.add_student_to_course(course, student, &admin());
    let service = EnrollmentService::new(SqliteStore::try_new(&reader_conn).unwrap());
    assert!(service.get_course(course).unwrap().is_enrolled(student));
}
