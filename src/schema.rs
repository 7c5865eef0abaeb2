// Kept in sync by hand with `repository::context::SCHEMA_SQL`.

diesel::table! {
    companies (id) {
        id -> Integer,
        employer_id -> Nullable<BigInt>,
        employer_name -> Text,
        gvkey -> Nullable<BigInt>,
        is_gvkey -> Integer,
        id_not_found -> Integer,
        url_old -> Nullable<Text>,
        url_new -> Nullable<Text>,
        ticker -> Nullable<Text>,
        query -> Nullable<Text>,
        number_of_pages -> Nullable<BigInt>,
        all_reviews_count -> Nullable<BigInt>,
        rated_reviews_count -> Nullable<BigInt>,
        overall_rating -> Nullable<Double>,
        ceo_name -> Nullable<Text>,
        ceo_rating -> Nullable<Double>,
        recommend_to_friend_rating -> Nullable<Double>,
        culture_and_values_rating -> Nullable<Double>,
        diversity_and_inclusion_rating -> Nullable<Double>,
        career_opportunities_rating -> Nullable<Double>,
        work_life_balance_rating -> Nullable<Double>,
        senior_management_rating -> Nullable<Double>,
        compensation_and_benefits_rating -> Nullable<Double>,
        business_outlook_rating -> Nullable<Double>,
        last_scraped -> Nullable<Text>,
    }
}

diesel::table! {
    reviews (id) {
        id -> Integer,
        review_id -> BigInt,
        employer_id -> Nullable<BigInt>,
        date_time -> Text,
        review_text -> Text,
        rating_overall -> Nullable<Double>,
        rating_ceo -> Nullable<Text>,
        rating_business_outlook -> Nullable<Text>,
        rating_work_life_balance -> Nullable<Double>,
        rating_culture_and_values -> Nullable<Double>,
        rating_diversity_and_inclusion -> Nullable<Double>,
        rating_senior_leadership -> Nullable<Double>,
        rating_recommend_to_friend -> Nullable<Text>,
        rating_career_opportunities -> Nullable<Double>,
        rating_compensation_and_benefits -> Nullable<Double>,
        is_current_job -> Integer,
        length_of_employment -> Nullable<BigInt>,
        employment_status -> Nullable<Text>,
        job_ending_year -> Nullable<BigInt>,
        job_title -> Nullable<Text>,
        location -> Nullable<Text>,
        pros -> Nullable<Text>,
        cons -> Nullable<Text>,
        summary -> Nullable<Text>,
        advice -> Nullable<Text>,
        count_helpful -> Nullable<BigInt>,
        count_not_helpful -> Nullable<BigInt>,
        is_covid19 -> Nullable<Integer>,
        scraped_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(companies, reviews);
