use interceptor_test::*;

#[test]
fn non_string_simple() {
    run_test(Flavor::NonString, false);
}

#[test]
fn non_string_threaded() {
    run_threaded_test(Flavor::NonString, 8);
}
