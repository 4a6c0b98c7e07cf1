use interceptor_test::*;

#[test]
fn formatted_simple() {
    run_test(Flavor::Formatted, false);
}

#[test]
fn formatted_threaded() {
    run_threaded_test(Flavor::Formatted, 8);
}
