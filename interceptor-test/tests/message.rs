use interceptor_test::*;

#[test]
fn message_simple() {
    run_test(Flavor::Message, false);
}

#[test]
fn message_threaded() {
    run_threaded_test(Flavor::Message, 8);
}
