use enrollment_core::db::open_db_in_memory;
use enrollment_core::{
    Caller, CourseRequest, EnrollmentError, EnrollmentService, ProfileInput, SqliteStore,
    MAX_COURSES_PER_TEACHER,
};
use rusqlite::Connection;

fn admin() -> Caller {
    Caller::admin(1)
}

fn service(conn: &Connection) -> EnrollmentService<SqliteStore<'_>> {
    EnrollmentService::new(SqliteStore::try_new(conn).unwrap())
}

fn new_teacher(service: &EnrollmentService<SqliteStore<'_>>, name: &str) -> i64 {
    service
        .create_teacher(&admin(), &ProfileInput::named(name))
        .unwrap()
        .teacher
        .id
}

fn new_courses(service: &EnrollmentService<SqliteStore<'_>>, count: usize) -> Vec<i64> {
    (0..count)
        .map(|index| {
            service
                .create_course(&admin(), &CourseRequest::new(format!("Course {index}")))
                .unwrap()
                .course
                .id
        })
        .collect()
}

#[test]
fn sixth_course_is_rejected_until_one_is_unassigned() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "Barbara");
    let courses = new_courses(&service, MAX_COURSES_PER_TEACHER + 1);

    for course in &courses[..MAX_COURSES_PER_TEACHER] {
        service
            .assign_teacher_to_course(&admin(), teacher, *course)
            .unwrap();
    }

    let sixth = courses[MAX_COURSES_PER_TEACHER];
    let err = service
        .assign_teacher_to_course(&admin(), teacher, sixth)
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::ValidationFailed(_)));
    assert_eq!(service.get_course(sixth).unwrap().course.teacher_id, None);

    service
        .unassign_teacher_from_course(&admin(), teacher, courses[0])
        .unwrap();
    let view = service
        .assign_teacher_to_course(&admin(), teacher, sixth)
        .unwrap();
    assert_eq!(view.course_ids.len(), MAX_COURSES_PER_TEACHER);
    assert!(view.teaches(sixth));
    assert!(!view.teaches(courses[0]));
}

#[test]
fn create_course_with_teacher_respects_cap() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "Alan");

    for index in 0..MAX_COURSES_PER_TEACHER {
        service
            .create_course(
                &admin(),
                &CourseRequest::new(format!("Seminar {index}")).teacher(teacher),
            )
            .unwrap();
    }
    let err = service
        .create_course(&admin(), &CourseRequest::new("One too many").teacher(teacher))
        .unwrap_err();

    assert!(matches!(err, EnrollmentError::ValidationFailed(_)));
    assert_eq!(service.list_courses().unwrap().len(), MAX_COURSES_PER_TEACHER);
}

#[test]
fn assigning_same_teacher_twice_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "John");
    let course = new_courses(&service, 1)[0];

    let first = service
        .assign_teacher_to_course(&admin(), teacher, course)
        .unwrap();
    let second = service
        .assign_teacher_to_course(&admin(), teacher, course)
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(second.course_ids, vec![course]);
}

#[test]
fn teacher_at_cap_can_be_reassigned_to_own_course() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "Frances");
    let courses = new_courses(&service, MAX_COURSES_PER_TEACHER);
    for course in &courses {
        service
            .assign_teacher_to_course(&admin(), teacher, *course)
            .unwrap();
    }

    service
        .assign_teacher_to_course(&admin(), teacher, courses[2])
        .unwrap();
    let updated = service
        .update_course(
            &admin(),
            courses[2],
            &CourseRequest::new("Renamed").teacher(teacher),
        )
        .unwrap();
    assert_eq!(updated.course.name, "Renamed");
    assert_eq!(updated.course.teacher_id, Some(teacher));
}

#[test]
fn reassignment_moves_course_between_teachers() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let previous = new_teacher(&service, "Previous");
    let next = new_teacher(&service, "Next");
    let course = new_courses(&service, 1)[0];

    service
        .assign_teacher_to_course(&admin(), previous, course)
        .unwrap();
    service
        .assign_teacher_to_course(&admin(), next, course)
        .unwrap();

    assert!(service.get_teacher(previous).unwrap().course_ids.is_empty());
    assert_eq!(service.get_teacher(next).unwrap().course_ids, vec![course]);
    assert_eq!(
        service.get_course(course).unwrap().course.teacher_id,
        Some(next)
    );
}

#[test]
fn unassigning_teacher_not_on_course_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let owner = new_teacher(&service, "Owner");
    let other = new_teacher(&service, "Other");
    let course = service
        .create_course(&admin(), &CourseRequest::new("Logic").teacher(owner))
        .unwrap()
        .course
        .id;

    let err = service
        .unassign_teacher_from_course(&admin(), other, course)
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::ValidationFailed(_)));
    assert_eq!(
        service.get_course(course).unwrap().course.teacher_id,
        Some(owner)
    );
}

#[test]
fn teacher_caller_cannot_assign_teachers() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "Self Assigner");
    let course = new_courses(&service, 1)[0];

    let err = service
        .assign_teacher_to_course(&Caller::teacher(teacher), teacher, course)
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::Unauthorized(_)));
}

#[test]
fn assignment_requires_existing_teacher_and_course() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "Real");
    let course = new_courses(&service, 1)[0];

    assert!(matches!(
        service.assign_teacher_to_course(&admin(), 77, course),
        Err(EnrollmentError::TeacherNotFound(77))
    ));
    assert!(matches!(
        service.assign_teacher_to_course(&admin(), teacher, 88),
        Err(EnrollmentError::CourseNotFound(88))
    ));
}

#[test]
fn update_course_moves_teacher_and_checks_capacity() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let previous = new_teacher(&service, "Previous");
    let next = new_teacher(&service, "Next");
    let course = service
        .create_course(
            &admin(),
            &CourseRequest::new("Physics").max_students(3).teacher(previous),
        )
        .unwrap()
        .course
        .id;
    for name in ["a", "b"] {
        let student = service
            .create_student(&admin(), &ProfileInput::named(name))
            .unwrap()
            .student
            .id;
        service
            .add_student_to_course(course, student, &admin())
            .unwrap();
    }

    let err = service
        .update_course(
            &admin(),
            course,
            &CourseRequest::new("Physics").max_students(1).teacher(next),
        )
        .unwrap_err();
    assert!(matches!(err, EnrollmentError::ValidationFailed(_)));
    let unchanged = service.get_course(course).unwrap();
    assert_eq!(unchanged.course.max_students, 3);
    assert_eq!(unchanged.course.teacher_id, Some(previous));

    let updated = service
        .update_course(
            &admin(),
            course,
            &CourseRequest::new("Physics II").max_students(2).teacher(next),
        )
        .unwrap();
    assert_eq!(updated.course.name, "Physics II");
    assert_eq!(updated.course.max_students, 2);
    assert_eq!(updated.course.teacher_id, Some(next));
    assert_eq!(updated.enrolled_student_ids.len(), 2);
    assert!(service.get_teacher(previous).unwrap().course_ids.is_empty());
}

#[test]
fn update_course_without_teacher_keeps_current_assignment() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let teacher = new_teacher(&service, "Keeper");
    let course = service
        .create_course(&admin(), &CourseRequest::new("Music").teacher(teacher))
        .unwrap()
        .course
        .id;

    let updated = service
        .update_course(&admin(), course, &CourseRequest::new("Music Theory"))
        .unwrap();
    assert_eq!(updated.course.teacher_id, Some(teacher));
    assert!(matches!(
        service.update_course(&admin(), 5150, &CourseRequest::new("Ghost")),
        Err(EnrollmentError::CourseNotFound(5150))
    ));
}
