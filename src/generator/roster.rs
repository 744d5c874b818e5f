use crate::models::{Gender, NewUser, Role};

/// A fixed synthetic student
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RosterMember {
  pub name: &'static str,
  pub email: &'static str,
  pub grade: i64,
  pub gender: Gender,
}

impl RosterMember {
  pub fn to_new_user(&self) -> NewUser {
    NewUser {
      email: self.email.to_string(),
      name: self.name.to_string(),
      role: Role::Student,
      grade: Some(self.grade),
      gender: Some(self.gender),
    }
  }
}

const fn member(name: &'static str, email: &'static str, grade: i64, gender: Gender) -> RosterMember {
  RosterMember { name, email, grade, gender }
}

/// 24 students, 12 male and 12 female, grades 9-12
pub const KAZAKH_ROSTER: [RosterMember; 24] = [
  member("Aidar Zhumadilov", "student1@sleepystudy.kz", 9, Gender::Male),
  member("Nursultan Akhmetov", "student2@sleepystudy.kz", 10, Gender::Male),
  member("Yerbol Satbayev", "student3@sleepystudy.kz", 11, Gender::Male),
  member("Dias Tulegenov", "student4@sleepystudy.kz", 9, Gender::Male),
  member("Arman Utemuratov", "student5@sleepystudy.kz", 10, Gender::Male),
  member("Nurlan Kozhabekov", "student6@sleepystudy.kz", 11, Gender::Male),
  member("Daniyar Bekturov", "student7@sleepystudy.kz", 12, Gender::Male),
  member("Timur Auezov", "student8@sleepystudy.kz", 9, Gender::Male),
  member("Azamat Sultanbekov", "student9@sleepystudy.kz", 10, Gender::Male),
  member("Samat Temirgaliyev", "student10@sleepystudy.kz", 11, Gender::Male),
  member("Yerlan Nurpeisov", "student11@sleepystudy.kz", 12, Gender::Male),
  member("Bolat Nurmukhanov", "student12@sleepystudy.kz", 10, Gender::Male),
  member("Aizhan Mukhamejanova", "student13@sleepystudy.kz", 9, Gender::Female),
  member("Madina Esenova", "student14@sleepystudy.kz", 10, Gender::Female),
  member("Aliya Nurpeisova", "student15@sleepystudy.kz", 11, Gender::Female),
  member("Dinara Smagulova", "student16@sleepystudy.kz", 12, Gender::Female),
  member("Assel Bektursynova", "student17@sleepystudy.kz", 9, Gender::Female),
  member("Gulmira Nurbekova", "student18@sleepystudy.kz", 10, Gender::Female),
  member("Ainur Dauletova", "student19@sleepystudy.kz", 11, Gender::Female),
  member("Zarina Kaliyeva", "student20@sleepystudy.kz", 12, Gender::Female),
  member("Saule Zhanseitova", "student21@sleepystudy.kz", 9, Gender::Female),
  member("Aigerim Baitasova", "student22@sleepystudy.kz", 10, Gender::Female),
  member("Gulnaz Orazova", "student23@sleepystudy.kz", 11, Gender::Female),
  member("Akmaral Tulegenova", "student24@sleepystudy.kz", 12, Gender::Female),
];
